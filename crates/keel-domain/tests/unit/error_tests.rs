//! Unit tests for the domain error type

use keel_domain::error::Error;
use std::error::Error as _;

#[test]
fn test_configuration_error_display() {
    let err = Error::configuration("Bean name 'foo' is already used");
    assert!(err.is_configuration());
    assert!(!err.is_illegal_state());
    assert_eq!(
        err.to_string(),
        "Configuration error: Bean name 'foo' is already used"
    );
}

#[test]
fn test_illegal_state_error_display() {
    let err = Error::illegal_state("Bootstrap container already initialised");
    assert!(err.is_illegal_state());
    assert_eq!(
        err.to_string(),
        "Illegal state: Bootstrap container already initialised"
    );
}

#[test]
fn test_infrastructure_error_keeps_source() {
    let cause = Error::not_found("dyn Foo");
    let err = Error::infrastructure_with_source("Error occurred while starting component", cause);

    assert!(err.is_infrastructure());
    let source = err.source().expect("source should be kept");
    assert_eq!(source.to_string(), "Not found: dyn Foo");
}

#[test]
fn test_resolution_errors_display() {
    assert_eq!(
        Error::type_mismatch("foo", "dyn Bar").to_string(),
        "Type mismatch: component 'foo' is not a dyn Bar"
    );
    assert_eq!(
        Error::cyclic_dependency("A -> B -> A").to_string(),
        "Cyclic dependency: A -> B -> A"
    );
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
    let err: Error = io.into();
    assert!(matches!(err, Error::IoSimple { .. }));
    assert!(err.to_string().contains("missing.toml"));
}
