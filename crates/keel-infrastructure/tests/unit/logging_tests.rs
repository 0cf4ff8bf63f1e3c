//! Logging setup tests

use keel_infrastructure::logging::{init_logging, parse_log_level, LoggingConfig};
use tracing::Level;

/// Test level names are parsed case-insensitively
#[test]
fn test_parse_log_level() {
    assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
    assert_eq!(parse_log_level("Info").unwrap(), Level::INFO);
    assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
}

/// Test unknown level names are configuration errors
#[test]
fn test_parse_invalid_log_level() {
    let err = parse_log_level("verbose").unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("verbose"));
}

/// Test an invalid level fails before any subscriber is installed
#[test]
fn test_init_logging_rejects_invalid_level() {
    let config = LoggingConfig {
        level: "loud".to_string(),
        ..Default::default()
    };
    assert!(init_logging(config).is_err());
}
