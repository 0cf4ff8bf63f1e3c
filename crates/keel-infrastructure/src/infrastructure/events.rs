//! Event Publisher Infrastructure
//!
//! In-process implementations of the [`EventPublisher`] port.

use crate::di::InstanceId;
use keel_domain::error::Result;
use keel_domain::events::LifecycleEvent;
use keel_domain::ports::{EventListener, EventPublisher};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

// ============================================================================
// Null Event Publisher (Testing)
// ============================================================================

/// Null event publisher for testing
///
/// Accepts listeners and discards every event.
#[derive(Debug, Default)]
pub struct NullEventPublisher;

impl NullEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl EventPublisher for NullEventPublisher {
    fn register(&self, _listener: Arc<dyn EventListener>) -> Result<()> {
        Ok(())
    }

    fn unregister_all(&self) {}

    fn publish(&self, _event: &LifecycleEvent) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// In-Memory Event Publisher (Production)
// ============================================================================

/// Synchronous event publisher delivering to listeners in registration order
///
/// A listener is identified by its allocation, so registering the same
/// `Arc` twice keeps one subscription.
#[derive(Default)]
pub struct InMemoryEventPublisher {
    listeners: RwLock<Vec<(InstanceId, Arc<dyn EventListener>)>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for InMemoryEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventPublisher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn register(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        let id = InstanceId::of(&listener);
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|(existing, _)| *existing == id) {
            debug!(listener = listener.listener_name(), "Listener already registered");
            return Ok(());
        }
        debug!(listener = listener.listener_name(), "Registered listener");
        listeners.push((id, listener));
        Ok(())
    }

    fn unregister_all(&self) {
        let removed = std::mem::take(
            &mut *self.listeners.write().unwrap_or_else(PoisonError::into_inner),
        );
        debug!(count = removed.len(), "Unregistered all listeners");
    }

    fn publish(&self, event: &LifecycleEvent) -> Result<()> {
        // Snapshot so listeners may register or publish while being notified
        let listeners: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        match serde_json::to_string(event) {
            Ok(payload) => debug!(%payload, listeners = listeners.len(), "Publishing event"),
            Err(e) => warn!(event = event.name(), "Failed to serialize event: {}", e),
        }

        for listener in listeners {
            listener.on_event(event);
        }
        Ok(())
    }
}
