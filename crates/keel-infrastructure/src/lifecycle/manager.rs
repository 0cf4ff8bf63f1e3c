//! Component Manager
//!
//! Drives the staged bring-up of the component container and its symmetric
//! teardown. Every phase operation is serialised on the manager; readers
//! (`get`, `state`, `readiness`) never wait for a phase to finish.
//!
//! ## Architecture
//!
//! ```text
//!   bootstrap_initialise ──► setup_initialise (optional)
//!            │
//!         dispose
//!            │
//!            ▼
//!   initialise(eager) ──► start ──► stop ──► dispose
//!   │                     │
//!   ├─ full registrar     ├─ startables (plugin system skipped)
//!   ├─ extension provider ├─ event listeners
//!   ├─ plugin system      ├─ eager instantiation
//!   ├─ plugin components  └─ ManagerStarted
//!   └─ initializing hooks
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let manager = ComponentManager::builder(config.container)
//!     .bootstrap_registrar(register_bootstrap)
//!     .full_registrar(register_full)
//!     .build();
//!
//! manager.bootstrap_initialise()?;
//! manager.dispose();
//! manager.initialise(true)?;
//! manager.start()?;
//! // ...
//! manager.shutdown();
//! ```

use super::plugin_system::PluginSystem;
use super::reclaim::ReclaimWatch;
use crate::config::ContainerConfig;
use crate::constants::{BOOTSTRAP_CONTAINER_NAME, FULL_CONTAINER_NAME};
use crate::di::{
    clear_metadata_cache, ComponentContainer, ContainerHostComponentProvider, ContainerProvider,
    ContainerRegistrar, InstanceId, NoopRegistrar, PluginAccessor, WrappedComponentContainer,
};
use crate::error_ext::component_failure;
use arc_swap::ArcSwapOption;
use chrono::{SecondsFormat, Utc};
use keel_domain::error::{Error, Result};
use keel_domain::events::LifecycleEvent;
use keel_domain::ports::{EventPublisher, PluginSystemLifecycle};
use keel_domain::value_objects::{LifecycleState, Readiness};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Which registrar populated the installed container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerPhase {
    Bootstrap,
    Full,
}

struct Installed {
    phase: ContainerPhase,
    wrapped: Arc<WrappedComponentContainer>,
}

/// Orchestrates container bring-up, start, stop and dispose
pub struct ComponentManager {
    /// Serialises phase operations
    lifecycle: Mutex<()>,
    state: Mutex<LifecycleState>,
    installed: ArcSwapOption<Installed>,
    plugin_system: PluginSystem,
    eager: AtomicBool,
    bootstrap_registrar: Arc<dyn ContainerRegistrar>,
    setup_registrar: Arc<dyn ContainerRegistrar>,
    full_registrar: Arc<dyn ContainerRegistrar>,
    extension_providers: HashMap<String, Arc<dyn ContainerProvider>>,
    config: ContainerConfig,
}

/// Builder for [`ComponentManager`]
///
/// Registrars that are not set register nothing.
pub struct ComponentManagerBuilder {
    config: ContainerConfig,
    bootstrap_registrar: Arc<dyn ContainerRegistrar>,
    setup_registrar: Arc<dyn ContainerRegistrar>,
    full_registrar: Arc<dyn ContainerRegistrar>,
    extension_providers: HashMap<String, Arc<dyn ContainerProvider>>,
}

impl ComponentManagerBuilder {
    fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            bootstrap_registrar: Arc::new(NoopRegistrar),
            setup_registrar: Arc::new(NoopRegistrar),
            full_registrar: Arc::new(NoopRegistrar),
            extension_providers: HashMap::new(),
        }
    }

    /// Registrar for the container used before persistent storage is available
    pub fn bootstrap_registrar(mut self, registrar: impl ContainerRegistrar + 'static) -> Self {
        self.bootstrap_registrar = Arc::new(registrar);
        self
    }

    /// Registrar adding the first-run setup components to the bootstrap container
    pub fn setup_registrar(mut self, registrar: impl ContainerRegistrar + 'static) -> Self {
        self.setup_registrar = Arc::new(registrar);
        self
    }

    /// Registrar for the full container
    pub fn full_registrar(mut self, registrar: impl ContainerRegistrar + 'static) -> Self {
        self.full_registrar = Arc::new(registrar);
        self
    }

    /// Make a container provider selectable through `extension_provider` in the config
    pub fn extension_provider(
        mut self,
        name: impl Into<String>,
        provider: impl ContainerProvider + 'static,
    ) -> Self {
        self.extension_providers
            .insert(name.into(), Arc::new(provider));
        self
    }

    pub fn build(self) -> ComponentManager {
        ComponentManager {
            lifecycle: Mutex::new(()),
            state: Mutex::new(LifecycleState::NotStarted),
            installed: ArcSwapOption::empty(),
            plugin_system: PluginSystem::new(),
            eager: AtomicBool::new(self.config.eager_instantiation),
            bootstrap_registrar: self.bootstrap_registrar,
            setup_registrar: self.setup_registrar,
            full_registrar: self.full_registrar,
            extension_providers: self.extension_providers,
            config: self.config,
        }
    }
}

impl ComponentManager {
    pub fn builder(config: ContainerConfig) -> ComponentManagerBuilder {
        ComponentManagerBuilder::new(config)
    }

    /// Manager whose registrars register nothing
    pub fn new(config: ContainerConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Readiness flags for health checks
    pub fn readiness(&self) -> Readiness {
        self.state().readiness()
    }

    /// Whether `start` instantiates every component before reporting started
    pub fn is_eager(&self) -> bool {
        self.eager.load(Ordering::SeqCst)
    }

    pub fn is_plugin_system_running(&self) -> bool {
        self.plugin_system.is_started()
    }

    /// The installed wrapped container
    pub fn container(&self) -> Result<Arc<WrappedComponentContainer>> {
        self.installed
            .load_full()
            .map(|installed| Arc::clone(&installed.wrapped))
            .ok_or_else(|| Error::illegal_state("Component container has not been initialised"))
    }

    /// The active container, decorated if an extension provider was applied
    pub fn current(&self) -> Result<Arc<ComponentContainer>> {
        self.container()?.current()
    }

    /// Resolve `I` from the active container
    pub fn get<I>(&self) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.current()?.get::<I>()
    }

    /// Provider publishing the exposed components to the plugin host
    pub fn host_component_provider(&self) -> Result<ContainerHostComponentProvider> {
        self.container()?.host_component_provider()
    }

    // ========================================================================
    // Bring-up
    // ========================================================================

    /// Create the bootstrap container, usable before persistent storage exists
    pub fn bootstrap_initialise(&self) -> Result<()> {
        let _guard = self.lock_lifecycle();
        self.ensure_no_container()?;
        self.state()
            .transition_to(LifecycleState::ContainerInitialised)?;

        let container = self.new_container(BOOTSTRAP_CONTAINER_NAME);
        info!(container = %container.name(), "Initialising bootstrap container");
        if let Err(e) = self.bootstrap_registrar.register_components(&container) {
            container.dispose();
            return Err(e);
        }
        self.install(ContainerPhase::Bootstrap, WrappedComponentContainer::new(container));
        self.change_state(LifecycleState::ContainerInitialised)
    }

    /// Add the first-run setup components to the bootstrap container
    pub fn setup_initialise(&self) -> Result<()> {
        let _guard = self.lock_lifecycle();
        let installed = self.installed.load_full().ok_or_else(|| {
            Error::illegal_state(
                "The bootstrap container has not been initialised, you cannot initialise a setup container",
            )
        })?;
        if installed.phase == ContainerPhase::Full {
            return Err(Error::illegal_state(
                "The full container cannot be used to initialise a setup container",
            ));
        }
        let state = self.state();
        if state != LifecycleState::ContainerInitialised {
            return Err(Error::illegal_state(format!(
                "The component manager is {state} so you cannot initialise a setup container"
            )));
        }

        let container = installed.wrapped.facade()?;
        info!(container = %container.name(), "Initialising setup components");
        self.setup_registrar.register_components(&container)
    }

    /// Create the full container and bring it to `ComponentsRegistered`
    ///
    /// Requires that no container is installed; dispose the bootstrap
    /// container first. `eager` decides whether [`Self::start`] instantiates
    /// every component before reporting started.
    pub fn initialise(&self, eager: bool) -> Result<()> {
        let _guard = self.lock_lifecycle();
        self.ensure_no_container()?;
        self.state()
            .transition_to(LifecycleState::ContainerInitialised)?;
        let extension = self.extension_provider()?;

        self.eager.store(eager, Ordering::SeqCst);
        let container = self.new_container(FULL_CONTAINER_NAME);
        info!(container = %container.name(), eager, "Initialising full container");
        if let Err(e) = self.full_registrar.register_components(&container) {
            container.dispose();
            return Err(e);
        }

        let wrapped = WrappedComponentContainer::new(container);
        if let Some((name, provider)) = extension {
            if let Err(e) = wrapped.wrap_with(provider.as_ref()) {
                wrapped.dispose();
                return Err(Error::configuration_with_source(
                    format!("Error applying extension container provider '{name}'"),
                    e,
                ));
            }
        }
        let wrapped = self.install(ContainerPhase::Full, wrapped);
        self.change_state(LifecycleState::ContainerInitialised)?;

        self.start_plugin_system(&wrapped)?;
        self.change_state(LifecycleState::PluginSystemStarted)?;

        self.register_plugin_components(&wrapped)?;
        let current = wrapped.current()?;
        self.run_initializing_components(&current)?;
        self.change_state(LifecycleState::ComponentsRegistered)
    }

    /// [`Self::initialise`] with the configured eager instantiation default
    pub fn initialise_default(&self) -> Result<()> {
        self.initialise(self.config.eager_instantiation)
    }

    /// Run startable components, subscribe listeners and report started
    pub fn start(&self) -> Result<()> {
        let _guard = self.lock_lifecycle();
        self.state().transition_to(LifecycleState::Started)?;
        let current = self.current()?;

        self.run_startables(&current)?;
        self.register_event_listeners(&current)?;
        if self.is_eager() {
            let resolved = current.instantiate_all()?;
            info!(resolved, "Eagerly instantiated components");
        }

        self.change_state(LifecycleState::Started)?;
        self.publish(&current, &LifecycleEvent::ManagerStarted);
        Ok(())
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Announce shutdown and stop the plugin system
    ///
    /// Never fails; plugin system errors are logged.
    pub fn stop(&self) {
        let _guard = self.lock_lifecycle();
        match self.current() {
            Ok(current) => self.publish(&current, &LifecycleEvent::ManagerShuttingDown),
            Err(_) => debug!("No component container; shutdown not announced"),
        }
        self.plugin_system.shutdown();
    }

    /// Reset to `NotStarted` and tear the container down
    pub fn dispose(&self) {
        let _guard = self.lock_lifecycle();
        clear_metadata_cache();
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            info!(from = %*state, "Disposing component manager");
            *state = LifecycleState::NotStarted;
        }

        if self.plugin_system.reset() {
            warn!("Plugin system was still running when the component manager was disposed");
        }

        let Some(installed) = self.installed.swap(None) else {
            debug!("No component container to dispose");
            return;
        };
        let watch = ReclaimWatch::watch(&installed.wrapped);
        if let Ok(current) = installed.wrapped.current() {
            match current.try_get::<dyn EventPublisher>() {
                Ok(Some(publisher)) => publisher.unregister_all(),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Could not unregister event listeners"),
            }
        }
        installed.wrapped.dispose();
        drop(installed);
        watch.check(self.config.reclaim_attempts);
    }

    /// [`Self::stop`] followed by [`Self::dispose`]
    pub fn shutdown(&self) {
        self.stop();
        self.dispose();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn change_state(&self, next: LifecycleState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        *state = previous.transition_to(next)?;
        info!(from = %previous, to = %next, "Component manager state changed");
        Ok(())
    }

    fn ensure_no_container(&self) -> Result<()> {
        if self.installed.load().is_some() {
            return Err(Error::illegal_state("Component container is already initialised"));
        }
        Ok(())
    }

    fn new_container(&self, phase: &str) -> Arc<ComponentContainer> {
        let created = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        ComponentContainer::with_config(format!("{phase}_{created}"), self.config.clone())
    }

    fn install(
        &self,
        phase: ContainerPhase,
        wrapped: WrappedComponentContainer,
    ) -> Arc<WrappedComponentContainer> {
        let wrapped = Arc::new(wrapped);
        self.installed.store(Some(Arc::new(Installed {
            phase,
            wrapped: Arc::clone(&wrapped),
        })));
        wrapped
    }

    fn extension_provider(&self) -> Result<Option<(&str, &Arc<dyn ContainerProvider>)>> {
        let Some(name) = self.config.extension_provider.as_deref() else {
            return Ok(None);
        };
        self.extension_providers
            .get_key_value(name)
            .map(|(name, provider)| Some((name.as_str(), provider)))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Error loading extension container provider with name '{name}'"
                ))
            })
    }

    fn start_plugin_system(&self, wrapped: &WrappedComponentContainer) -> Result<()> {
        let lifecycle = wrapped
            .current()?
            .try_get::<dyn PluginSystemLifecycle>()?
            .ok_or_else(|| Error::infrastructure("No plugin system lifecycle is registered"))?;
        self.plugin_system.start(lifecycle)
    }

    fn register_plugin_components(&self, wrapped: &WrappedComponentContainer) -> Result<()> {
        let Some(accessor) = wrapped.current()?.try_get::<dyn PluginAccessor>()? else {
            debug!("No plugin accessor registered; skipping plugin components");
            return Ok(());
        };
        let facade = wrapped.facade()?;
        for descriptor in accessor.enabled_component_descriptors() {
            info!(plugin = descriptor.plugin_key(), "Registering plugin components");
            descriptor
                .register_components(&facade)
                .map_err(|e| component_failure("registering", descriptor.plugin_key(), e))?;
        }
        Ok(())
    }

    fn run_initializing_components(&self, container: &ComponentContainer) -> Result<()> {
        for entry in container.hook_table().initializing {
            let (_, component) = entry.resolve(container)?;
            if let Err(e) = component.after_instantiation() {
                let name = entry.key().type_path();
                error!(component = %name, error = %e, "Error occurred while initializing component");
                return Err(component_failure("initializing", name, e));
            }
        }
        Ok(())
    }

    fn run_startables(&self, container: &ComponentContainer) -> Result<()> {
        let plugin_system = self
            .plugin_system
            .lifecycle()
            .map(|lifecycle| InstanceId::of(&lifecycle));
        for entry in container.hook_table().startable {
            let (instance, startable) = entry.resolve(container)?;
            if Some(instance.id()) == plugin_system {
                debug!(component = %entry.key(), "Plugin system is already started");
                continue;
            }
            if let Err(e) = startable.start() {
                let name = entry.key().type_path();
                error!(component = %name, error = %e, "Error occurred while starting component");
                return Err(component_failure("starting", name, e));
            }
        }
        Ok(())
    }

    fn register_event_listeners(&self, container: &ComponentContainer) -> Result<()> {
        let listeners = container.hook_table().listeners;
        if listeners.is_empty() {
            return Ok(());
        }
        let publisher = container.try_get::<dyn EventPublisher>()?.ok_or_else(|| {
            Error::configuration("Components are listed as event listeners but no event publisher is registered")
        })?;

        let mut registered: HashSet<InstanceId> = HashSet::new();
        for entry in listeners {
            let (instance, listener) = entry.resolve(container)?;
            if registered.insert(instance.id()) {
                publisher.register(listener)?;
            }
        }
        debug!(count = registered.len(), "Registered event listeners");
        Ok(())
    }

    fn publish(&self, container: &ComponentContainer, event: &LifecycleEvent) {
        match container.try_get::<dyn EventPublisher>() {
            Ok(Some(publisher)) => {
                if let Err(e) = publisher.publish(event) {
                    warn!(event = event.name(), error = %e, "Failed to publish lifecycle event");
                }
            }
            Ok(None) => debug!(event = event.name(), "No event publisher registered"),
            Err(e) => warn!(event = event.name(), error = %e, "Event publisher unavailable"),
        }
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("state", &self.state())
            .field("eager", &self.is_eager())
            .field("plugin_system_running", &self.plugin_system.is_started())
            .field(
                "container",
                &self.current().ok().map(|container| container.name().to_string()),
            )
            .finish()
    }
}
