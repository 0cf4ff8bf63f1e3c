//! Infrastructure layer constants

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "keel.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "keel";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "KEEL";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "KEEL_LOG";

/// File stem used by the rolling file appender when none is given
pub const LOG_FILE_STEM: &str = "keel";

// ============================================================================
// CONTAINER CONSTANTS
// ============================================================================

/// Name prefix of the container created by bootstrap initialisation
pub const BOOTSTRAP_CONTAINER_NAME: &str = "keel-bootstrap";

/// Name prefix of the container created by full initialisation
pub const FULL_CONTAINER_NAME: &str = "keel-full";

/// Eager instantiation is on unless configured otherwise
pub const DEFAULT_EAGER_INSTANTIATION: bool = true;

/// Upper bound for reclaim checks after dispose
pub const MAX_RECLAIM_ATTEMPTS: u32 = 10;

/// Bean names already taken by the plugin host, keyed by interface path
pub const HOST_BEAN_NAME_ALIASES: &[(&str, &str)] = &[
    ("keel_domain::ports::events::EventPublisher", "keelEventPublisher"),
    (
        "keel_infrastructure::di::registrar::PluginAccessor",
        "keelPluginAccessor",
    ),
];
