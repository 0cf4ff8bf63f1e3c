//! Switching adapter tests

use crate::fixtures::{Foo, FooImpl, OtherFoo};
use keel_domain::error::Result;
use keel_domain::value_objects::Scope;
use keel_infrastructure::di::{
    Candidate, ComponentAdapter, ComponentContainer, ResolvedOnceSwitchingAdapter,
    SwitchingAdapter,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn container_with_candidates() -> Arc<ComponentContainer> {
    let container = ComponentContainer::new("switching");
    container
        .implementation::<FooImpl, _>(Scope::Internal, |_| {
            Ok(Arc::new(FooImpl::counted("enabled", &AtomicUsize::new(0))))
        })
        .unwrap();
    container
        .instance::<OtherFoo>(Scope::Internal, Arc::new(OtherFoo))
        .unwrap();
    container
}

fn enabled() -> Candidate<dyn Foo> {
    Candidate::implementation::<FooImpl>(|f| f as Arc<dyn Foo>)
}

fn disabled() -> Candidate<dyn Foo> {
    Candidate::implementation::<OtherFoo>(|f| f as Arc<dyn Foo>)
}

// ============================================================================
// Per-call predicate
// ============================================================================

/// Test the predicate is consulted on every resolution
#[test]
fn test_switching_follows_predicate_per_call() {
    let container = container_with_candidates();
    let importing = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&importing);
    container
        .component(
            Scope::Exposed,
            Arc::new(SwitchingAdapter::new(enabled(), disabled(), move || {
                flag.load(Ordering::SeqCst)
            })),
        )
        .unwrap();

    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "enabled");
    importing.store(false, Ordering::SeqCst);
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "other");
    importing.store(true, Ordering::SeqCst);
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "enabled");
}

/// Test the chosen side is the candidate's own singleton
#[test]
fn test_switching_returns_candidate_instance() {
    let container = container_with_candidates();
    container
        .component(
            Scope::Internal,
            Arc::new(SwitchingAdapter::new(enabled(), disabled(), || true)),
        )
        .unwrap();

    let switched = container.get::<dyn Foo>().unwrap();
    let direct = container.get::<FooImpl>().unwrap();
    assert_eq!(Arc::as_ptr(&switched).cast::<()>(), Arc::as_ptr(&direct).cast::<()>());
}

/// Test fixed instances can be candidates
#[test]
fn test_switching_with_instances() {
    let container = ComponentContainer::new("switching");
    let adapter = SwitchingAdapter::<dyn Foo>::new(
        Candidate::<dyn Foo>::instance(Arc::new(OtherFoo)),
        Candidate::key(keel_infrastructure::di::ComponentKey::named("missing")),
        || true,
    );
    assert!(adapter.implementation().starts_with("switch("));
    container.component(Scope::Internal, Arc::new(adapter)).unwrap();
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "other");
}

// ============================================================================
// Resolved once per container
// ============================================================================

fn once_adapter(configured: &Arc<AtomicBool>) -> Arc<ResolvedOnceSwitchingAdapter<dyn Foo>> {
    let flag = Arc::clone(configured);
    Arc::new(ResolvedOnceSwitchingAdapter::new(
        enabled(),
        disabled(),
        move |_: &ComponentContainer| -> Result<bool> { Ok(flag.load(Ordering::SeqCst)) },
    ))
}

/// Test the first answer sticks even when the condition changes later
#[test]
fn test_resolved_once_keeps_first_answer() {
    let container = container_with_candidates();
    let configured = Arc::new(AtomicBool::new(false));
    let adapter = once_adapter(&configured);
    container.component(Scope::Exposed, adapter.clone()).unwrap();

    assert_eq!(adapter.decision(), None);
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "other");

    configured.store(true, Ordering::SeqCst);
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "other");
    assert_eq!(adapter.decision(), Some(false));
}

/// Test disposing the adapter forgets the decision
#[test]
fn test_resolved_once_reset_on_dispose() {
    let container = container_with_candidates();
    let configured = Arc::new(AtomicBool::new(true));
    let adapter = once_adapter(&configured);
    container.component(Scope::Internal, adapter.clone()).unwrap();

    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "enabled");
    adapter.dispose();
    assert_eq!(adapter.decision(), None);

    configured.store(false, Ordering::SeqCst);
    assert_eq!(container.get::<dyn Foo>().unwrap().label(), "other");
}
