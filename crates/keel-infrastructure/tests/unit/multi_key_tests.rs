//! Multi-key registrant tests

use crate::fixtures::{Bar, Foo, FooImpl};
use keel_domain::value_objects::Scope;
use keel_infrastructure::di::{ComponentContainer, ComponentKey, MultipleKeyRegistrant};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn registrant(builds: &Arc<AtomicUsize>) -> MultipleKeyRegistrant<FooImpl> {
    let builds = Arc::clone(builds);
    MultipleKeyRegistrant::registrant_for(move |_| Ok(Arc::new(FooImpl::counted("shared", &builds))))
}

/// Test every key resolves to the same instance, built once
#[test]
fn test_all_keys_share_one_instance() {
    let container = ComponentContainer::new("multi-key");
    let builds = Arc::new(AtomicUsize::new(0));
    registrant(&builds)
        .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
        .implementing::<dyn Bar>(|f| f as Arc<dyn Bar>)
        .register_with(Scope::Exposed, &container)
        .unwrap();

    let foo = container.get::<dyn Foo>().unwrap();
    let bar = container.get::<dyn Bar>().unwrap();
    let concrete = container.get::<FooImpl>().unwrap();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(Arc::as_ptr(&foo).cast::<()>(), Arc::as_ptr(&concrete).cast::<()>());
    assert_eq!(Arc::as_ptr(&bar).cast::<()>(), Arc::as_ptr(&concrete).cast::<()>());
}

/// Test the implementation key stays internal while interfaces use the default scope
#[test]
fn test_interfaces_use_default_scope() {
    let container = ComponentContainer::new("multi-key");
    let builds = Arc::new(AtomicUsize::new(0));
    registrant(&builds)
        .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
        .implementing_in::<dyn Bar>(Scope::Internal, |f| f as Arc<dyn Bar>)
        .register_with(Scope::Exposed, &container)
        .unwrap();

    let registry = container.registry();
    assert_eq!(registry.keys(), vec![ComponentKey::of::<dyn Foo>()]);
    assert!(!registry.is_exposed(&ComponentKey::of::<FooImpl>()));
    assert!(container.contains(&ComponentKey::of::<dyn Bar>()));
}

/// Test registering without any interface is a precondition violation
#[test]
fn test_register_without_interfaces_fails() {
    let container = ComponentContainer::new("multi-key");
    let builds = Arc::new(AtomicUsize::new(0));
    let err = registrant(&builds)
        .register_with(Scope::Exposed, &container)
        .unwrap_err();

    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("Must call implementing() at least once"));
    assert!(container.is_empty());
}

/// Test explicit constructor arguments are resolved in order
#[test]
fn test_registrant_with_parameters() {
    let container = ComponentContainer::new("multi-key");
    container
        .instance_named::<String>(Scope::Internal, "label", Arc::new("from-args".to_string()))
        .unwrap();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);

    MultipleKeyRegistrant::<FooImpl>::registrant_with(vec![ComponentKey::named("label")], move |args| {
        let label = args.get::<String>(0)?;
        Ok(Arc::new(FooImpl::counted(&label, &counter)))
    })
    .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
    .register_with(Scope::Exposed, &container)
    .unwrap();

    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "from-args");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

/// Test a second registrant for the same implementation is a duplicate key
#[test]
fn test_duplicate_implementation_is_rejected() {
    let container = ComponentContainer::new("multi-key");
    let builds = Arc::new(AtomicUsize::new(0));
    registrant(&builds)
        .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
        .register_with(Scope::Exposed, &container)
        .unwrap();

    let err = registrant(&builds)
        .implementing::<dyn Bar>(|f| f as Arc<dyn Bar>)
        .register_with(Scope::Exposed, &container)
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!container.contains(&ComponentKey::of::<dyn Bar>()));
}

/// Test a rejected alias leaves no primary binding or exposed key behind
#[test]
fn test_rejected_alias_binds_nothing() {
    let container = ComponentContainer::new("multi-key");
    let existing: Arc<dyn Bar> = Arc::new(FooImpl::counted("existing", &AtomicUsize::new(0)));
    container
        .instance::<dyn Bar>(Scope::Exposed, existing)
        .unwrap();
    let builds = Arc::new(AtomicUsize::new(0));

    let err = registrant(&builds)
        .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
        .implementing::<dyn Bar>(|f| f as Arc<dyn Bar>)
        .register_with(Scope::Exposed, &container)
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(!container.contains(&ComponentKey::of::<dyn Foo>()));
    assert!(!container.contains(&ComponentKey::of::<FooImpl>()));
    assert_eq!(container.registry().keys(), vec![ComponentKey::of::<dyn Bar>()]);
    assert_eq!(container.get::<dyn Bar>().unwrap().label(), "existing");
    assert_eq!(builds.load(Ordering::SeqCst), 0);
}

/// Test listing the same interface twice is rejected before anything is bound
#[test]
fn test_repeated_interface_is_rejected() {
    let container = ComponentContainer::new("multi-key");
    let builds = Arc::new(AtomicUsize::new(0));

    let err = registrant(&builds)
        .implementing::<dyn Foo>(|f| f as Arc<dyn Foo>)
        .implementing_in::<dyn Foo>(Scope::Internal, |f| f as Arc<dyn Foo>)
        .register_with(Scope::Exposed, &container)
        .unwrap_err();

    assert!(err.to_string().contains("listed more than once"));
    assert!(container.is_empty());
    assert!(container.registry().is_empty());
}
