//! # Infrastructure Layer
//!
//! The staged component container and everything it needs to run.
//!
//! ## Module Categories
//!
//! ### Container & Lifecycle
//! | Module | Description |
//! |--------|-------------|
//! | [`di`] | Scoped container, adapters, multi-key and switching bindings |
//! | [`lifecycle`] | Component manager driving bring-up and teardown |
//! | [`accessor`] | Boundary lookup of the installed manager |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | TOML and environment configuration |
//! | [`constants`] | Centralized configuration constants |
//! | [`logging`] | Structured logging with tracing |
//!
//! ### Collaborators
//! | Module | Description |
//! |--------|-------------|
//! | [`infrastructure`] | In-memory event publisher and plugin system stand-ins |

pub mod accessor;
pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod infrastructure;
pub mod lifecycle;
pub mod logging;

// Re-export commonly used types
pub use di::{ComponentContainer, ComponentKey, MultipleKeyRegistrant, WrappedComponentContainer};
pub use error_ext::ErrorContext;
pub use lifecycle::ComponentManager;
