//! Configuration management
//!
//! Figment-backed loading of [`AppConfig`] from defaults, a TOML file and
//! `KEEL_`-prefixed environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, ContainerConfig, LoggingConfig, UnresolvedExposedPolicy};
