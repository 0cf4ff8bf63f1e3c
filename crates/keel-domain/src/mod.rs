//! # Keel Domain
//!
//! Core types for the staged component container: lifecycle states, binding
//! scopes, lifecycle events and the ports that components and collaborators
//! implement.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error enum and `Result` alias |
//! | [`value_objects`] | [`Scope`], [`LifecycleState`], [`Readiness`] |
//! | [`events`] | [`LifecycleEvent`] |
//! | [`ports`] | Lifecycle and event bus contracts |

/// Error handling types
pub mod error;
/// Domain events
pub mod events;
/// Component and collaborator ports
pub mod ports;
/// Value objects
pub mod value_objects;

pub use error::{Error, Result};
pub use events::LifecycleEvent;
pub use ports::{
    EventListener, EventPublisher, InitializingComponent, PluginSystemLifecycle, Startable,
};
pub use value_objects::{LifecycleState, Readiness, Scope};
