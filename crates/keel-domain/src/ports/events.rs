//! Event Publisher Domain Port
//!
//! Defines the contract used to announce lifecycle events and to subscribe
//! components to them. Dispatch is synchronous.

use crate::error::Result;
use crate::events::LifecycleEvent;
use std::sync::Arc;

/// A component subscribed to lifecycle announcements
pub trait EventListener: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &LifecycleEvent);

    /// Name used when logging deliveries
    fn listener_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Domain port for publishing lifecycle events
///
/// # Example
///
/// ```no_run
/// use keel_domain::events::LifecycleEvent;
/// use keel_domain::ports::EventPublisher;
///
/// fn announce(publisher: &dyn EventPublisher) -> keel_domain::Result<()> {
///     publisher.publish(&LifecycleEvent::ManagerStarted)
/// }
/// ```
pub trait EventPublisher: Send + Sync {
    /// Subscribe a listener; registering the same listener twice is a no-op
    fn register(&self, listener: Arc<dyn EventListener>) -> Result<()>;

    /// Remove every listener
    fn unregister_all(&self);

    /// Deliver an event to every registered listener
    fn publish(&self, event: &LifecycleEvent) -> Result<()>;
}
