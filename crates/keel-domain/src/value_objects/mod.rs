//! Domain Value Objects
//!
//! Small immutable values shared by the container and the lifecycle
//! orchestrator.
//!
//! ## Value Objects
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`Scope`] | Visibility of a binding: exposed to the plugin host or internal |
//! | [`LifecycleState`] | Bring-up phase of the component manager |
//! | [`Readiness`] | Snapshot of the four readiness flags for health checks |

/// Binding visibility
pub mod scope;
/// Lifecycle states and readiness flags
pub mod lifecycle;

pub use lifecycle::{LifecycleState, Readiness};
pub use scope::Scope;
