//! Configuration types

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Component container configuration
    #[serde(default)]
    pub container: ContainerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to file in addition to stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// What to do when an exposed key has no resolvable instance at publish time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedExposedPolicy {
    /// Log a warning and leave the key out of the published set
    #[default]
    Warn,
    /// Fail the publish with a configuration error
    Fail,
}

/// Component container configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Instantiate every component on one thread before the manager starts
    pub eager_instantiation: bool,

    /// Handling of exposed keys that resolve to nothing
    pub unresolved_exposed: UnresolvedExposedPolicy,

    /// How many times dispose checks that the old container was released
    pub reclaim_attempts: u32,

    /// Name of the registered container provider that decorates the full container
    pub extension_provider: Option<String>,

    /// Bean name overrides keyed by interface path, on top of the built-in table
    pub bean_name_aliases: BTreeMap<String, String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            eager_instantiation: DEFAULT_EAGER_INSTANTIATION,
            unresolved_exposed: UnresolvedExposedPolicy::default(),
            reclaim_attempts: MAX_RECLAIM_ATTEMPTS,
            extension_provider: None,
            bean_name_aliases: BTreeMap::new(),
        }
    }
}

impl ContainerConfig {
    /// Bean name override for an interface path, if any
    pub fn bean_name_alias(&self, interface_path: &str) -> Option<&str> {
        self.bean_name_aliases
            .get(interface_path)
            .map(String::as_str)
            .or_else(|| {
                HOST_BEAN_NAME_ALIASES
                    .iter()
                    .find(|(path, _)| *path == interface_path)
                    .map(|(_, alias)| *alias)
            })
    }
}
