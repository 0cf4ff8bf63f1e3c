//! Component Container
//!
//! A thin façade over the binding table and a dill catalog. Every
//! registration declares a [`Scope`]; exposed registrations are recorded in
//! the container's [`ScopedRegistry`]. Values bound under a type key live in
//! the container's [`ComponentCatalog`]. Resolution falls back to the parent
//! container when a key is not bound locally.
//!
//! ## Usage
//!
//! ```ignore
//! let container = ComponentContainer::new("keel-full");
//! container.instance::<dyn Clock>(Scope::Internal, Arc::new(SystemClock))?;
//! container.implementation::<dyn IndexManager, _>(Scope::Exposed, |c| {
//!     Ok(Arc::new(DefaultIndexManager::new(c.get::<dyn Clock>()?)))
//! })?;
//!
//! let manager = container.get::<dyn IndexManager>()?;
//! ```

use super::adapter::{CachingAdapter, ComponentAdapter, InstanceAdapter, SharedAdapter};
use super::catalog::ComponentCatalog;
use super::hooks::{ComponentHooks, HookTable};
use super::host_components::ContainerHostComponentProvider;
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use super::registry::{Component, ScopedRegistry};
use crate::config::ContainerConfig;
use keel_domain::error::{Error, Result};
use keel_domain::value_objects::Scope;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::debug;

/// Converts the instance of a primary binding into the instance an alias key answers with
pub(crate) type AliasCast =
    Arc<dyn Fn(&ComponentInstance) -> Option<ComponentInstance> + Send + Sync>;

/// Entry of the binding table
#[derive(Clone)]
enum Binding {
    /// A key with its own adapter
    Primary(SharedAdapter),
    /// An extra key answering with the instance of a primary binding
    Alias {
        primary: ComponentKey,
        cast: AliasCast,
    },
}

#[derive(Default)]
struct Bindings {
    order: Vec<ComponentKey>,
    entries: HashMap<ComponentKey, Binding>,
}

/// Explicit constructor arguments handed to a factory
pub struct Arguments<'a> {
    container: &'a ComponentContainer,
    keys: &'a [ComponentKey],
    values: &'a [ComponentInstance],
}

impl<'a> Arguments<'a> {
    /// The argument at `index` as `Arc<T>`
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let (key, value) = self
            .keys
            .get(index)
            .zip(self.values.get(index))
            .ok_or_else(|| {
                Error::illegal_state(format!(
                    "Constructor argument {index} requested but only {} were declared",
                    self.keys.len()
                ))
            })?;
        value
            .downcast::<T>()
            .ok_or_else(|| Error::type_mismatch(key.to_string(), type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The resolving container, for dependencies not listed as parameters
    pub fn container(&self) -> &'a ComponentContainer {
        self.container
    }
}

/// DI container with scoped registration and parent fallback
pub struct ComponentContainer {
    name: String,
    parent: Option<Arc<ComponentContainer>>,
    config: ContainerConfig,
    bindings: RwLock<Bindings>,
    catalog: Arc<ComponentCatalog>,
    registry: ScopedRegistry,
    hooks: ComponentHooks,
    this: Weak<ComponentContainer>,
}

impl ComponentContainer {
    /// Create an empty root container with default settings
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_config(name, ContainerConfig::default())
    }

    /// Create an empty root container
    pub fn with_config(name: impl Into<String>, config: ContainerConfig) -> Arc<Self> {
        Self::build(name.into(), None, config)
    }

    /// Create an empty container resolving missing keys from `parent`
    pub fn child_of(name: impl Into<String>, parent: Arc<ComponentContainer>) -> Arc<Self> {
        let config = parent.config.clone();
        Self::build(name.into(), Some(parent), config)
    }

    fn build(name: String, parent: Option<Arc<Self>>, config: ContainerConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name,
            parent,
            config,
            bindings: RwLock::new(Bindings::default()),
            catalog: Arc::new(ComponentCatalog::new()),
            registry: ScopedRegistry::new(),
            hooks: ComponentHooks::default(),
            this: this.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ComponentContainer>> {
        self.parent.as_ref()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Exposed keys of this container
    pub fn registry(&self) -> &ScopedRegistry {
        &self.registry
    }

    /// Lifecycle hook lists of this container
    pub fn hooks(&self) -> &ComponentHooks {
        &self.hooks
    }

    /// Typed values of this container
    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a ready-made value under the key of `I`
    pub fn instance<I>(&self, scope: Scope, value: Arc<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<I>();
        let adapter = InstanceAdapter::cataloged::<I>(key.clone(), Arc::clone(&self.catalog));
        self.bind_then(scope, key, Binding::Primary(Arc::new(adapter)), || {
            self.catalog.add_value(value);
        })
    }

    /// Register a ready-made value under a string key
    ///
    /// String keys are never exposed, whatever the scope.
    pub fn instance_named<T>(&self, scope: Scope, name: &str, value: Arc<T>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::named(name);
        let adapter = InstanceAdapter::new(key.clone(), ComponentInstance::new(value));
        self.bind(scope, key, Binding::Primary(Arc::new(adapter)))
    }

    /// Register a singleton built by `factory` on first resolution
    pub fn implementation<I, F>(&self, scope: Scope, factory: F) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&ComponentContainer) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<I>();
        let adapter = CachingAdapter::cataloged::<I, _>(
            key.clone(),
            Vec::new(),
            Arc::clone(&self.catalog),
            move |container: &ComponentContainer, _: &[ComponentInstance]| {
                factory(container).map(ComponentInstance::new)
            },
        );
        self.bind(scope, key, Binding::Primary(Arc::new(adapter)))
    }

    /// Register a singleton whose constructor arguments are the given keys
    ///
    /// The keys are resolved in order and handed to `factory` as [`Arguments`].
    pub fn implementation_with<I, F>(
        &self,
        scope: Scope,
        parameters: Vec<ComponentKey>,
        factory: F,
    ) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<I>();
        let keys = parameters.clone();
        let adapter = CachingAdapter::cataloged::<I, _>(
            key.clone(),
            parameters,
            Arc::clone(&self.catalog),
            move |container: &ComponentContainer, values: &[ComponentInstance]| {
                factory(&Arguments {
                    container,
                    keys: &keys,
                    values,
                })
                .map(ComponentInstance::new)
            },
        );
        self.bind(scope, key, Binding::Primary(Arc::new(adapter)))
    }

    /// Register a custom adapter under its own key
    pub fn component(&self, scope: Scope, adapter: SharedAdapter) -> Result<()> {
        let key = adapter.key().clone();
        self.bind(scope, key, Binding::Primary(adapter))
    }

    /// Register `key` as another name for the instance bound to `primary`
    pub(crate) fn alias(
        &self,
        scope: Scope,
        key: ComponentKey,
        primary: ComponentKey,
        cast: AliasCast,
    ) -> Result<()> {
        self.bind(scope, key, Binding::Alias { primary, cast })
    }

    fn bind(&self, scope: Scope, key: ComponentKey, binding: Binding) -> Result<()> {
        self.bind_then(scope, key, binding, || ())
    }

    /// Bind `key`, running `bound` before the binding becomes visible to resolvers
    fn bind_then(
        &self,
        scope: Scope,
        key: ComponentKey,
        binding: Binding,
        bound: impl FnOnce(),
    ) -> Result<()> {
        let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
        if bindings.entries.contains_key(&key) {
            return Err(self.already_registered(&key));
        }
        if scope.is_exposed() {
            self.registry.expose(&key)?;
        }
        debug!(container = %self.name, key = %key, scope = %scope, "Registered component");
        bound();
        bindings.order.push(key.clone());
        bindings.entries.insert(key, binding);
        Ok(())
    }

    /// Fail with the error [`Self::bind`] would report for `key`, without binding it
    pub(crate) fn check_bindable(&self, scope: Scope, key: &ComponentKey) -> Result<()> {
        let bound = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key);
        if bound {
            return Err(self.already_registered(key));
        }
        if scope.is_exposed() && !key.is_named() {
            if !key.is_interface() {
                return Err(Error::configuration(format!(
                    "{key} must be an interface to expose"
                )));
            }
            if self.registry.is_exposed(key) {
                return Err(Error::configuration(format!("{key} has already been exposed")));
            }
        }
        Ok(())
    }

    fn already_registered(&self, key: &ComponentKey) -> Error {
        Error::configuration(format!(
            "Component key {key} is already registered in container '{}'",
            self.name
        ))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn binding(&self, key: &ComponentKey) -> Option<Binding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(key)
            .cloned()
    }

    /// Resolve the instance bound to `key`, or `None` when nothing is bound
    pub fn try_resolve(&self, key: &ComponentKey) -> Result<Option<ComponentInstance>> {
        match self.binding(key) {
            Some(Binding::Primary(adapter)) => adapter.instance(self).map(Some),
            Some(Binding::Alias { primary, cast }) => {
                let instance = self.resolve(&primary)?;
                cast(&instance)
                    .map(Some)
                    .ok_or_else(|| Error::type_mismatch(key.to_string(), key.type_name()))
            }
            None => match &self.parent {
                Some(parent) => parent.try_resolve(key),
                None => Ok(None),
            },
        }
    }

    /// Resolve the instance bound to `key`
    pub fn resolve(&self, key: &ComponentKey) -> Result<ComponentInstance> {
        self.try_resolve(key)?.ok_or_else(|| {
            Error::not_found(format!("No component registered for {key} in '{}'", self.name))
        })
    }

    /// Resolve the component bound to the key of `I`
    pub fn get<I>(&self) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<I>();
        let instance = self.resolve(&key)?;
        instance
            .downcast::<I>()
            .ok_or_else(|| Error::type_mismatch(key.to_string(), type_name::<I>()))
    }

    /// Like [`Self::get`], but `None` when nothing is bound
    pub fn try_get<I>(&self) -> Result<Option<Arc<I>>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::of::<I>();
        match self.try_resolve(&key)? {
            Some(instance) => instance
                .downcast::<I>()
                .map(Some)
                .ok_or_else(|| Error::type_mismatch(key.to_string(), type_name::<I>())),
            None => Ok(None),
        }
    }

    /// Resolve a value registered under a string key
    pub fn get_named<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ComponentKey::named(name);
        let instance = self.resolve(&key)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| Error::type_mismatch(key.to_string(), type_name::<T>()))
    }

    /// Whether `key` is bound here or in a parent
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.binding(key).is_some() || self.parent.as_ref().is_some_and(|p| p.contains(key))
    }

    /// Locally bound keys in registration order
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    /// Adapter producing the instance for `key`
    ///
    /// An alias yields an adapter that reports the alias key and resolves
    /// through its primary binding.
    pub fn adapter(&self, key: &ComponentKey) -> Option<SharedAdapter> {
        match self.binding(key)? {
            Binding::Primary(adapter) => Some(adapter),
            Binding::Alias { primary, cast } => {
                let target = self.adapter(&primary)?;
                Some(Arc::new(AliasAdapter {
                    key: key.clone(),
                    primary,
                    implementation: target.implementation().to_owned(),
                    cast,
                }))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Publishing and lifecycle support
    // ========================================================================

    /// Exposed components of this container, grouped by instance
    pub fn components(&self) -> Result<Vec<Component>> {
        self.registry
            .components(self, self.config.unresolved_exposed)
    }

    /// Provider publishing this container's exposed components to the plugin host
    pub fn host_component_provider(&self) -> ContainerHostComponentProvider {
        ContainerHostComponentProvider::new(self.this.clone(), self.this.clone())
    }

    /// Hook lists of this container and its ancestors, ancestors first
    pub fn hook_table(&self) -> HookTable {
        let mut table = self
            .parent
            .as_ref()
            .map(|parent| parent.hook_table())
            .unwrap_or_default();
        self.hooks.extend_table(&mut table);
        table
    }

    /// Instantiate every bound component, ancestors first, in registration order
    ///
    /// Runs on the calling thread so that later concurrent resolutions only
    /// ever hit cached singletons. Returns the number of keys resolved.
    pub fn instantiate_all(&self) -> Result<usize> {
        let mut resolved = match &self.parent {
            Some(parent) => parent.instantiate_all()?,
            None => 0,
        };
        for key in self.keys() {
            self.resolve(&key)?;
            resolved += 1;
        }
        debug!(container = %self.name, resolved, "Eagerly instantiated components");
        Ok(resolved)
    }

    /// Remove every binding, drop cached instances and forget exposures and hooks
    pub fn dispose(&self) {
        let drained = {
            let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
            bindings.order.clear();
            std::mem::take(&mut bindings.entries)
        };
        let count = drained.len();
        for binding in drained.into_values() {
            if let Binding::Primary(adapter) = binding {
                adapter.dispose();
            }
        }
        self.catalog.clear();
        self.registry.clear();
        self.hooks.clear();
        debug!(container = %self.name, count, "Disposed container");
    }
}

/// Adapter answering an alias key with the cast instance of its primary
struct AliasAdapter {
    key: ComponentKey,
    primary: ComponentKey,
    implementation: String,
    cast: AliasCast,
}

impl ComponentAdapter for AliasAdapter {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn implementation(&self) -> &str {
        &self.implementation
    }

    fn instance(&self, container: &ComponentContainer) -> Result<ComponentInstance> {
        let instance = container.resolve(&self.primary)?;
        (self.cast)(&instance)
            .ok_or_else(|| Error::type_mismatch(self.key.to_string(), self.key.type_name()))
    }
}

impl fmt::Debug for ComponentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentContainer")
            .field("name", &self.name)
            .field("components", &self.len())
            .field("exposed", &self.registry.len())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}
