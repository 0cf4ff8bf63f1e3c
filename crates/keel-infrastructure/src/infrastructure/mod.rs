//! Infrastructure Services
//!
//! Implementations of the collaborator ports the component manager drives.
//! Registrars bind them into the bootstrap or full container; the manager
//! only ever sees the port traits.
//!
//! | Type | Port |
//! |------|------|
//! | [`InMemoryEventPublisher`] | `EventPublisher` |
//! | [`NullEventPublisher`] | `EventPublisher` |
//! | [`StaticPluginAccessor`] | `PluginAccessor` |
//! | [`NullPluginSystem`] | `PluginSystemLifecycle` |

pub mod events;
pub mod plugins;

pub use events::{InMemoryEventPublisher, NullEventPublisher};
pub use plugins::{NullPluginSystem, StaticPluginAccessor};
