//! Lifecycle events

use serde::{Deserialize, Serialize};

/// Announcements published on the event bus by the component manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Every startable component ran and the manager reached `Started`
    ManagerStarted,
    /// The manager is about to stop the plugin system
    ManagerShuttingDown,
}

impl LifecycleEvent {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ManagerStarted => "manager_started",
            Self::ManagerShuttingDown => "manager_shutting_down",
        }
    }
}
