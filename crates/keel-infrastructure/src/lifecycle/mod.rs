//! Lifecycle Management
//!
//! The [`ComponentManager`] owns the installed container and moves it
//! through the [`LifecycleState`](keel_domain::LifecycleState) sequence.

pub mod manager;
pub mod plugin_system;
pub mod reclaim;

pub use manager::{ComponentManager, ComponentManagerBuilder};
pub use plugin_system::PluginSystem;
pub use reclaim::ReclaimWatch;
