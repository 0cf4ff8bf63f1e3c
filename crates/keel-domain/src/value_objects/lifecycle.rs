//! Component manager lifecycle states

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bring-up phase of the component manager
///
/// States only move forward one step at a time. The single exception is
/// [`LifecycleState::NotStarted`], which is reachable from any state and
/// represents a full reset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing has been created yet, or everything was disposed
    #[default]
    NotStarted,
    /// A container exists and its registrar has run
    ContainerInitialised,
    /// The plugin system has been started
    PluginSystemStarted,
    /// Plugin-contributed components have been registered
    ComponentsRegistered,
    /// Startable components ran and the manager is serving
    Started,
}

impl LifecycleState {
    /// All states in transition order
    pub const ALL: [Self; 5] = [
        Self::NotStarted,
        Self::ContainerInitialised,
        Self::PluginSystemStarted,
        Self::ComponentsRegistered,
        Self::Started,
    ];

    /// Position of this state in the transition order
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn is_container_initialised(self) -> bool {
        self >= Self::ContainerInitialised
    }

    pub fn is_plugin_system_started(self) -> bool {
        self >= Self::PluginSystemStarted
    }

    pub fn is_components_registered(self) -> bool {
        self >= Self::ComponentsRegistered
    }

    pub fn is_started(self) -> bool {
        self == Self::Started
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: Self) -> bool {
        next == Self::NotStarted || next.ordinal() == self.ordinal() + 1
    }

    /// Validate a transition, returning the new state
    pub fn transition_to(self, next: Self) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::illegal_state(format!(
                "Cannot change component manager state from {self} to {next}"
            )))
        }
    }

    /// Readiness flags derived from this state
    pub fn readiness(self) -> Readiness {
        Readiness {
            state: self,
            container_initialised: self.is_container_initialised(),
            plugin_system_started: self.is_plugin_system_started(),
            components_registered: self.is_components_registered(),
            started: self.is_started(),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::ContainerInitialised => "CONTAINER_INITIALISED",
            Self::PluginSystemStarted => "PLUGIN_SYSTEM_STARTED",
            Self::ComponentsRegistered => "COMPONENTS_REGISTERED",
            Self::Started => "STARTED",
        };
        f.write_str(name)
    }
}

/// Readiness flags for external health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    /// State the flags were derived from
    pub state: LifecycleState,
    /// A container exists and has been populated
    pub container_initialised: bool,
    /// The plugin system is running
    pub plugin_system_started: bool,
    /// Plugin components are registered
    pub components_registered: bool,
    /// The manager has fully started
    pub started: bool,
}

impl Readiness {
    /// Flags in the order they become true
    pub fn flags(&self) -> [bool; 4] {
        [
            self.container_initialised,
            self.plugin_system_started,
            self.components_registered,
            self.started,
        ]
    }
}
