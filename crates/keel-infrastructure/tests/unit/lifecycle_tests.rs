//! Component manager lifecycle tests

use crate::fixtures::{Bar, Foo, FooImpl, Journal, OtherFoo, RecordingPluginSystem, Service};
use keel_domain::error::Result;
use keel_domain::ports::{EventListener, EventPublisher, PluginSystemLifecycle};
use keel_domain::value_objects::{LifecycleState, Scope};
use keel_infrastructure::config::ContainerConfig;
use keel_infrastructure::di::{
    ComponentContainer, ComponentModuleDescriptor, MultipleKeyRegistrant, PluginAccessor,
};
use keel_infrastructure::infrastructure::{InMemoryEventPublisher, StaticPluginAccessor};
use keel_infrastructure::lifecycle::{ComponentManager, ComponentManagerBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

fn register_plugin_system(container: &ComponentContainer, journal: &Arc<Journal>) -> Result<()> {
    let plugins = Arc::new(RecordingPluginSystem::new(journal));
    MultipleKeyRegistrant::<RecordingPluginSystem>::registrant_for(move |_| Ok(Arc::clone(&plugins)))
        .implementing::<dyn PluginSystemLifecycle>(|p| p as Arc<dyn PluginSystemLifecycle>)
        .register_with(Scope::Internal, container)?;
    container.hooks().startable::<RecordingPluginSystem>();
    Ok(())
}

fn manager_builder<F>(config: ContainerConfig, journal: &Arc<Journal>, register: F) -> ComponentManagerBuilder
where
    F: Fn(&ComponentContainer) -> Result<()> + Send + Sync + 'static,
{
    let journal = Arc::clone(journal);
    ComponentManager::builder(config).full_registrar(move |container: &ComponentContainer| {
        register_plugin_system(container, &journal)?;
        register(container)
    })
}

fn manager<F>(journal: &Arc<Journal>, register: F) -> ComponentManager
where
    F: Fn(&ComponentContainer) -> Result<()> + Send + Sync + 'static,
{
    manager_builder(ContainerConfig::default(), journal, register).build()
}

fn nothing(_: &ComponentContainer) -> Result<()> {
    Ok(())
}

// ============================================================================
// State machine
// ============================================================================

/// Test readiness flags only ever turn on, in their fixed order
#[test]
fn test_readiness_flags_are_monotonic() {
    let journal = Journal::shared();
    let manager = manager(&journal, nothing);

    let mut snapshots = vec![manager.readiness()];
    manager.initialise(false).unwrap();
    snapshots.push(manager.readiness());
    manager.start().unwrap();
    snapshots.push(manager.readiness());

    for pair in snapshots.windows(2) {
        for (before, after) in pair[0].flags().iter().zip(pair[1].flags()) {
            assert!(!before || after, "a readiness flag was cleared");
        }
    }
    for snapshot in &snapshots {
        let flags = snapshot.flags();
        for i in 1..flags.len() {
            assert!(!flags[i] || flags[i - 1], "flags turned on out of order");
        }
    }
    assert_eq!(snapshots[1].state, LifecycleState::ComponentsRegistered);
    assert!(manager.readiness().started);

    manager.dispose();
    assert_eq!(manager.readiness().flags(), [false; 4]);
}

/// Test start before initialise fails and leaves the state alone
#[test]
fn test_start_before_initialise_fails() {
    let manager = ComponentManager::new(ContainerConfig::default());
    let err = manager.start().unwrap_err();
    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("NOT_STARTED"));
    assert_eq!(manager.state(), LifecycleState::NotStarted);
}

/// Test bootstrap initialise twice is rejected
#[test]
fn test_bootstrap_twice_fails() {
    let manager = ComponentManager::new(ContainerConfig::default());
    manager.bootstrap_initialise().unwrap();
    let err = manager.bootstrap_initialise().unwrap_err();
    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("already initialised"));
    assert_eq!(manager.state(), LifecycleState::ContainerInitialised);
}

/// Test full initialise requires the bootstrap container to be disposed first
#[test]
fn test_initialise_over_bootstrap_fails() {
    let journal = Journal::shared();
    let manager = manager(&journal, nothing);
    manager.bootstrap_initialise().unwrap();

    let err = manager.initialise(false).unwrap_err();
    assert!(err.to_string().contains("already initialised"));
    assert_eq!(manager.state(), LifecycleState::ContainerInitialised);
    assert!(journal.entries().is_empty());

    manager.dispose();
    manager.initialise(false).unwrap();
    assert_eq!(manager.state(), LifecycleState::ComponentsRegistered);
}

// ============================================================================
// Setup phase
// ============================================================================

/// Test setup initialise without a bootstrap container fails without mutation
#[test]
fn test_setup_before_bootstrap_fails() {
    let manager = ComponentManager::new(ContainerConfig::default());
    let err = manager.setup_initialise().unwrap_err();
    assert!(err.is_illegal_state());
    assert!(err.to_string().contains("bootstrap container has not been initialised"));
    assert_eq!(manager.state(), LifecycleState::NotStarted);
    assert!(manager.container().is_err());
}

/// Test setup initialise is rejected on the full container
#[test]
fn test_setup_on_full_container_fails() {
    let journal = Journal::shared();
    let manager = manager(&journal, nothing);
    manager.initialise(false).unwrap();

    let err = manager.setup_initialise().unwrap_err();
    assert!(err.to_string().contains("full container cannot be used"));
    assert_eq!(manager.state(), LifecycleState::ComponentsRegistered);
}

/// Test a fresh bootstrap after dispose starts from an empty registry
#[test]
fn test_dispose_then_bootstrap_has_empty_registry() {
    let manager = ComponentManager::builder(ContainerConfig::default())
        .setup_registrar(|container: &ComponentContainer| {
            container.instance::<dyn Foo>(Scope::Exposed, Arc::new(OtherFoo))
        })
        .build();

    manager.bootstrap_initialise().unwrap();
    manager.setup_initialise().unwrap();
    assert_eq!(manager.current().unwrap().registry().len(), 1);

    manager.dispose();
    manager.bootstrap_initialise().unwrap();
    let container = manager.current().unwrap();
    assert!(container.registry().is_empty());
    assert!(container.is_empty());
}

// ============================================================================
// Bring-up callbacks
// ============================================================================

/// Test initializing hooks run during initialise and startables during start
#[test]
fn test_callbacks_run_in_phase_order() {
    let journal = Journal::shared();
    let recorder = Arc::clone(&journal);
    let manager = manager(&journal, move |container: &ComponentContainer| {
        container.instance::<Service>(Scope::Internal, Arc::new(Service::new("index", &recorder)))?;
        container.hooks().initializing::<Service>();
        container.hooks().startable::<Service>();
        Ok(())
    });

    manager.initialise(false).unwrap();
    assert_eq!(journal.entries(), vec!["plugins:start", "init:index"]);

    manager.start().unwrap();
    assert_eq!(
        journal.entries(),
        vec!["plugins:start", "init:index", "start:index"]
    );
    assert_eq!(journal.count("start:plugins"), 0);
}

/// Test a failing initializing hook aborts bring-up and names the component
#[test]
fn test_initializing_failure_is_fatal() {
    let journal = Journal::shared();
    let recorder = Arc::clone(&journal);
    let manager = manager(&journal, move |container: &ComponentContainer| {
        let service = Service::new("broken", &recorder).failing_init();
        container.instance::<Service>(Scope::Internal, Arc::new(service))?;
        container.hooks().initializing::<Service>();
        Ok(())
    });

    let err = manager.initialise(false).unwrap_err();
    assert!(err.is_infrastructure());
    let message = err.to_string();
    assert!(message.contains("Error occurred while initializing component"));
    assert!(message.contains("Service"));
    assert_eq!(manager.state(), LifecycleState::PluginSystemStarted);
}

/// Test a failing startable aborts start and leaves the manager short of started
#[test]
fn test_startable_failure_is_fatal() {
    let journal = Journal::shared();
    let recorder = Arc::clone(&journal);
    let manager = manager(&journal, move |container: &ComponentContainer| {
        let service = Service::new("broken", &recorder).failing_start();
        container.instance::<Service>(Scope::Internal, Arc::new(service))?;
        container.hooks().startable::<Service>();
        Ok(())
    });
    manager.initialise(false).unwrap();

    let err = manager.start().unwrap_err();
    assert!(err.is_infrastructure());
    assert!(err.to_string().contains("Error occurred while starting component"));
    assert_eq!(manager.state(), LifecycleState::ComponentsRegistered);
}

/// Test initialise fails when no plugin system lifecycle is bound
#[test]
fn test_missing_plugin_system_is_fatal() {
    let manager = ComponentManager::new(ContainerConfig::default());
    let err = manager.initialise(false).unwrap_err();
    assert!(err.is_infrastructure());
    assert!(err.to_string().contains("plugin system lifecycle"));
}

// ============================================================================
// Event listeners
// ============================================================================

/// Test one instance listed under two keys is subscribed once
#[test]
fn test_listener_registered_once_per_instance() {
    let journal = Journal::shared();
    let publisher = InMemoryEventPublisher::new_shared();
    let bus = Arc::clone(&publisher);
    let recorder = Arc::clone(&journal);
    let manager = manager(&journal, move |container: &ComponentContainer| {
        container.instance::<dyn EventPublisher>(Scope::Internal, bus.clone())?;
        let service = Arc::new(Service::new("audit", &recorder));
        container.instance::<Service>(Scope::Internal, Arc::clone(&service))?;
        container.instance::<dyn EventListener>(Scope::Internal, service)?;
        container.hooks().event_listener::<Service>();
        container
            .hooks()
            .event_listener_as::<dyn EventListener, _>(|listener: Arc<dyn EventListener>| listener);
        Ok(())
    });

    manager.initialise(false).unwrap();
    manager.start().unwrap();
    assert_eq!(publisher.listener_count(), 1);
    assert_eq!(journal.count("event:audit:manager_started"), 1);

    manager.stop();
    assert_eq!(journal.count("event:audit:manager_shutting_down"), 1);
    assert_eq!(journal.count("plugins:shutdown"), 1);

    manager.dispose();
    assert_eq!(publisher.listener_count(), 0);
}

/// Test listeners without an event publisher are a wiring error
#[test]
fn test_listeners_need_a_publisher() {
    let journal = Journal::shared();
    let recorder = Arc::clone(&journal);
    let manager = manager(&journal, move |container: &ComponentContainer| {
        container.instance::<Service>(Scope::Internal, Arc::new(Service::new("audit", &recorder)))?;
        container.hooks().event_listener::<Service>();
        Ok(())
    });
    manager.initialise(false).unwrap();

    let err = manager.start().unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(manager.state(), LifecycleState::ComponentsRegistered);
}

// ============================================================================
// Eager instantiation
// ============================================================================

fn counted_foo(builds: &Arc<AtomicUsize>) -> impl Fn(&ComponentContainer) -> Result<()> + Send + Sync + 'static {
    let builds = Arc::clone(builds);
    move |container: &ComponentContainer| {
        let builds = Arc::clone(&builds);
        container.implementation::<dyn Foo, _>(Scope::Exposed, move |_| {
            Ok(Arc::new(FooImpl::counted("eager", &builds)))
        })
    }
}

/// Test eager start builds every component before anyone asks for it
#[test]
fn test_eager_start_instantiates_everything() {
    let journal = Journal::shared();
    let builds = Arc::new(AtomicUsize::new(0));
    let manager = manager(&journal, counted_foo(&builds));

    manager.initialise(true).unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 0);
    manager.start().unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    manager.get::<dyn Foo>().unwrap();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

/// Test lazy start leaves construction to first resolution
#[test]
fn test_lazy_start_defers_instantiation() {
    let journal = Journal::shared();
    let builds = Arc::new(AtomicUsize::new(0));
    let manager = manager(&journal, counted_foo(&builds));

    manager.initialise(false).unwrap();
    manager.start().unwrap();
    assert!(!manager.is_eager());
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    assert_eq!(manager.get::<dyn Foo>().unwrap().label(), "eager");
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Extensions and plugins
// ============================================================================

fn layered(parent: Arc<ComponentContainer>) -> Result<Arc<ComponentContainer>> {
    let child = ComponentContainer::child_of("extension", parent);
    child.instance::<dyn Foo>(Scope::Internal, Arc::new(OtherFoo))?;
    Ok(child)
}

/// Test the configured extension provider decorates the full container
#[test]
fn test_extension_provider_wraps_full_container() {
    let journal = Journal::shared();
    let builds = Arc::new(AtomicUsize::new(0));
    let config = ContainerConfig {
        extension_provider: Some("layered".to_string()),
        ..Default::default()
    };
    let manager = manager_builder(config, &journal, counted_foo(&builds))
        .extension_provider("layered", layered)
        .build();

    manager.initialise(false).unwrap();
    assert!(manager.container().unwrap().is_wrapped());
    assert_eq!(manager.current().unwrap().name(), "extension");
    assert_eq!(manager.get::<dyn Foo>().unwrap().label(), "other");

    let published = manager
        .host_component_provider()
        .unwrap()
        .host_components()
        .unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].bean_name, "foo");
    let foo = published[0].instance.downcast::<dyn Foo>().unwrap();
    assert_eq!(foo.label(), "other");
    assert_eq!(builds.load(Ordering::SeqCst), 0);
}

struct BarModule {
    key: &'static str,
    fail: bool,
}

impl ComponentModuleDescriptor for BarModule {
    fn plugin_key(&self) -> &str {
        self.key
    }

    fn register_components(&self, container: &ComponentContainer) -> Result<()> {
        if self.fail {
            return Err(keel_domain::Error::generic("descriptor refused"));
        }
        let builds = AtomicUsize::new(0);
        container.instance::<dyn Bar>(Scope::Exposed, Arc::new(FooImpl::counted("plugin", &builds)))
    }
}

fn with_modules(
    modules: Vec<Arc<dyn ComponentModuleDescriptor>>,
) -> impl Fn(&ComponentContainer) -> Result<()> + Send + Sync + 'static {
    move |container: &ComponentContainer| {
        let accessor = Arc::new(StaticPluginAccessor::new(modules.clone()));
        container.instance::<dyn PluginAccessor>(Scope::Internal, accessor)
    }
}

/// Test plugin descriptors register into the full container after the plugin system starts
#[test]
fn test_plugin_components_are_registered() {
    let journal = Journal::shared();
    let module: Arc<dyn ComponentModuleDescriptor> = Arc::new(BarModule {
        key: "com.example.bar",
        fail: false,
    });
    let manager = manager(&journal, with_modules(vec![module]));

    manager.initialise(false).unwrap();
    assert_eq!(manager.get::<dyn Bar>().unwrap().label(), "plugin");
    assert_eq!(manager.current().unwrap().registry().len(), 1);
}

/// Test a failing descriptor aborts bring-up and names the plugin
#[test]
fn test_plugin_descriptor_failure_names_plugin() {
    let journal = Journal::shared();
    let module: Arc<dyn ComponentModuleDescriptor> = Arc::new(BarModule {
        key: "com.example.broken",
        fail: true,
    });
    let manager = manager(&journal, with_modules(vec![module]));

    let err = manager.initialise(false).unwrap_err();
    assert!(err.to_string().contains("com.example.broken"));
    assert_eq!(manager.state(), LifecycleState::PluginSystemStarted);
}

// ============================================================================
// Teardown
// ============================================================================

/// Test shutdown returns to not started and stop stays idempotent
#[test]
fn test_shutdown_resets_everything() {
    let journal = Journal::shared();
    let manager = manager(&journal, nothing);
    manager.initialise(false).unwrap();
    manager.start().unwrap();
    assert!(manager.is_plugin_system_running());

    manager.shutdown();
    assert_eq!(manager.state(), LifecycleState::NotStarted);
    assert!(!manager.is_plugin_system_running());
    assert!(manager.container().is_err());

    manager.stop();
    assert_eq!(journal.count("plugins:shutdown"), 1);
}

/// Test stop on a manager that never started does nothing
#[test]
fn test_stop_without_start_is_noop() {
    let manager = ComponentManager::new(ContainerConfig::default());
    manager.stop();
    manager.dispose();
    assert_eq!(manager.state(), LifecycleState::NotStarted);
}
