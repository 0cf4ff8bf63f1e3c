//! Component Ports
//!
//! Contracts implemented by components that take part in the lifecycle,
//! and by the collaborators the component manager talks to.
//!
//! | Port | Description |
//! |------|-------------|
//! | [`Startable`] | Called once when the manager starts |
//! | [`InitializingComponent`] | Called after the container is populated |
//! | [`PluginSystemLifecycle`] | Start and shut down the plugin system |
//! | [`EventPublisher`] | Lifecycle announcements and listener registration |
//! | [`EventListener`] | Receives lifecycle announcements |

/// Event bus ports
pub mod events;
/// Lifecycle participation ports
pub mod lifecycle;

pub use events::{EventListener, EventPublisher};
pub use lifecycle::{InitializingComponent, PluginSystemLifecycle, Startable};
