//! Plugin system state
//!
//! The component manager starts the plugin system itself, before any
//! plugin-contributed component exists, and shuts it down on stop. Start is
//! a no-op once running; shutdown is a no-op unless running and never fails.

use keel_domain::error::{Error, Result};
use keel_domain::ports::PluginSystemLifecycle;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

enum PluginSystemState {
    NotStarted,
    Started(Arc<dyn PluginSystemLifecycle>),
}

/// Tracks whether the plugin system is running and which lifecycle drives it
pub struct PluginSystem {
    state: Mutex<PluginSystemState>,
}

impl Default for PluginSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginSystem {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PluginSystemState::NotStarted),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PluginSystemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_started(&self) -> bool {
        matches!(*self.lock(), PluginSystemState::Started(_))
    }

    /// The lifecycle the running plugin system was started through
    pub fn lifecycle(&self) -> Option<Arc<dyn PluginSystemLifecycle>> {
        match &*self.lock() {
            PluginSystemState::Started(lifecycle) => Some(Arc::clone(lifecycle)),
            PluginSystemState::NotStarted => None,
        }
    }

    /// Start the plugin system through `lifecycle`
    ///
    /// Any failure is fatal and leaves the plugin system not started.
    pub fn start(&self, lifecycle: Arc<dyn PluginSystemLifecycle>) -> Result<()> {
        let mut state = self.lock();
        if matches!(*state, PluginSystemState::Started(_)) {
            return Ok(());
        }
        lifecycle.start().map_err(|e| {
            Error::infrastructure_with_source(
                format!("Error occurred while starting the plugin system. {e}"),
                e,
            )
        })?;
        info!("Plugin system started");
        *state = PluginSystemState::Started(lifecycle);
        Ok(())
    }

    /// Shut the plugin system down, logging and swallowing any failure
    pub fn shutdown(&self) {
        let mut state = self.lock();
        let PluginSystemState::Started(lifecycle) =
            std::mem::replace(&mut *state, PluginSystemState::NotStarted)
        else {
            return;
        };
        match lifecycle.shutdown() {
            Ok(()) => info!("Plugin system shut down"),
            Err(e) => error!(error = %e, "Error occurred while shutting down the plugin system"),
        }
    }

    /// Forget the running lifecycle without shutting it down
    ///
    /// Returns whether the plugin system was still marked as running.
    pub fn reset(&self) -> bool {
        matches!(
            std::mem::replace(&mut *self.lock(), PluginSystemState::NotStarted),
            PluginSystemState::Started(_)
        )
    }
}
