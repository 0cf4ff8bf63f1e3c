//! Dependency Injection System - Scoped Component Container
//!
//! Components are registered into a [`ComponentContainer`] with an explicit
//! [`Scope`](keel_domain::Scope). Exposed interface keys are recorded in the
//! container's [`ScopedRegistry`] and published to the plugin host by a
//! [`ContainerHostComponentProvider`].
//!
//! ## Architecture Overview
//!
//! ```text
//! WrappedComponentContainer
//! ├── current: decorated container (optional ContainerProvider)
//! └── facade:  ComponentContainer
//!              ├── bindings   key -> adapter | alias
//!              ├── catalog    dill catalog of typed singletons
//!              ├── registry   exposed interface keys
//!              └── hooks      initializing / startable / listeners
//! ```
//!
//! ## Key Principles
//!
//! - **Trait-object keys**: `dyn Trait` keys are interfaces, sized types are concrete
//! - **Singletons**: factories run once per container and the result is kept
//!   in the container's dill catalog; cycles are reported
//! - **Multi-key**: one implementation answers to several interfaces via aliases
//! - **Switching**: a key may pick between two candidates when resolved

pub mod adapter;
pub mod catalog;
pub mod container;
pub mod hooks;
pub mod host_components;
pub mod instance;
pub mod key;
pub mod multi_key;
pub mod registrar;
pub mod registry;
pub mod switching;
pub mod wrapped;

pub use adapter::{CachingAdapter, ComponentAdapter, InstanceAdapter, SharedAdapter};
pub use catalog::ComponentCatalog;
pub use container::{Arguments, ComponentContainer};
pub use hooks::{ComponentHooks, HookEntry, HookTable};
pub use host_components::{
    bean_name, BeanNames, ContainerHostComponentProvider, HostComponent, HostComponentProvider,
    HostComponentRegistrar,
};
pub use instance::{ComponentInstance, InstanceId};
pub use key::{clear_metadata_cache, ComponentKey, KeyKind};
pub use multi_key::MultipleKeyRegistrant;
pub use registrar::{ComponentModuleDescriptor, ContainerRegistrar, NoopRegistrar, PluginAccessor};
pub use registry::{Component, ScopedRegistry};
pub use switching::{Candidate, ResolvedOnceSwitchingAdapter, SwitchingAdapter};
pub use wrapped::{ContainerProvider, WrappedComponentContainer};
