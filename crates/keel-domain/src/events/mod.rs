//! Domain Events
//!
//! Events announced by the component manager as it moves through its
//! lifecycle.
//!
//! | Event | Description |
//! |-------|-------------|
//! | [`LifecycleEvent`] | Manager started / shutting down announcements |

/// Lifecycle event definitions
pub mod lifecycle_events;

pub use lifecycle_events::LifecycleEvent;
