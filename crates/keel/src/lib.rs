//! # Keel
//!
//! A staged dependency-injection container and lifecycle manager for
//! modular applications that host external plugins.
//!
//! This crate provides the main public API. It re-exports the domain types
//! and the container and lifecycle infrastructure.
//!
//! ## Features
//!
//! - **Staged bring-up**: bootstrap, setup and full containers driven by one manager
//! - **Scoped registration**: exposed interfaces are published to the plugin host
//! - **Multi-key bindings**: one singleton answers to several interfaces
//! - **Switching bindings**: implementations chosen per call or once per container
//!
//! ## Example
//!
//! ```ignore
//! use keel::{ComponentContainer, ComponentManager, Scope};
//!
//! fn register_full(container: &ComponentContainer) -> keel::Result<()> {
//!     container.instance::<dyn PluginSystemLifecycle>(Scope::Internal, plugin_system())?;
//!     container.implementation::<dyn IssueManager, _>(Scope::Exposed, |_| {
//!         Ok(Arc::new(DefaultIssueManager::default()))
//!     })
//! }
//!
//! let manager = ComponentManager::builder(config.container)
//!     .full_registrar(register_full)
//!     .build();
//! manager.initialise(true)?;
//! manager.start()?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Errors, lifecycle states, scopes, events and ports
//! - `infrastructure` - Container, lifecycle manager, config and logging

/// Domain layer - errors, value objects and ports
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use keel_domain::*;
}

/// Infrastructure layer - container, lifecycle, config and logging
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use keel_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the container and manager at the crate root
pub use infrastructure::di::{
    Candidate, ComponentContainer, ComponentKey, ContainerProvider, MultipleKeyRegistrant,
    ResolvedOnceSwitchingAdapter, SwitchingAdapter, WrappedComponentContainer,
};
pub use infrastructure::lifecycle::ComponentManager;
