//! Reclaim diagnostic
//!
//! After dispose the manager checks whether the discarded containers were
//! actually released. Anything still holding an `Arc` to them keeps every
//! plugin-contributed component alive, which is worth a warning. The check
//! is informational only.

use crate::di::{ComponentContainer, WrappedComponentContainer};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, warn};

/// Weak handles on the containers of one disposed wrapped container
pub struct ReclaimWatch {
    containers: Vec<(String, Weak<ComponentContainer>)>,
}

impl ReclaimWatch {
    /// Watch the façade and active container of `wrapped`
    pub fn watch(wrapped: &WrappedComponentContainer) -> Self {
        let mut containers: Vec<(String, Weak<ComponentContainer>)> = Vec::new();
        for container in [wrapped.facade(), wrapped.current()].into_iter().flatten() {
            if containers
                .iter()
                .any(|(_, weak)| weak.as_ptr() == Arc::as_ptr(&container))
            {
                continue;
            }
            containers.push((container.name().to_string(), Arc::downgrade(&container)));
        }
        Self { containers }
    }

    fn pinned(&self) -> Vec<&str> {
        self.containers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Check up to `attempts` times whether every watched container was released
    ///
    /// Yields between checks so other threads can drop their handles. Zero
    /// attempts skips the check.
    pub fn check(&self, attempts: u32) -> bool {
        if attempts == 0 {
            return true;
        }
        for attempt in 1..=attempts {
            let pinned = self.pinned();
            if pinned.is_empty() {
                debug!(attempt, "Disposed containers were released");
                return true;
            }
            debug!(attempt, pinned = ?pinned, "Waiting for disposed containers to be released");
            thread::yield_now();
        }
        warn!(
            pinned = ?self.pinned(),
            attempts,
            "Disposed containers are still referenced; their components stay in memory"
        );
        false
    }
}
