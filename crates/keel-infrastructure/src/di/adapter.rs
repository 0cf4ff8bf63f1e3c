//! Component adapters
//!
//! An adapter knows how to produce the instance bound to one key. The
//! container ships two: [`InstanceAdapter`] for values registered up front
//! and [`CachingAdapter`] for singletons built on first resolution. Both keep
//! their instance either locally or, for type keys bound by the container,
//! in the container's dill catalog.
//! Switching adapters live in [`super::switching`].

use super::catalog::{CatalogSlot, ComponentCatalog};
use super::container::ComponentContainer;
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use keel_domain::error::{Error, Result};
use std::any::type_name;
use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Produces the instance bound to a key
pub trait ComponentAdapter: Send + Sync {
    /// Key this adapter answers to
    fn key(&self) -> &ComponentKey;

    /// Implementation name, for diagnostics
    fn implementation(&self) -> &str;

    /// Resolve the instance
    fn instance(&self, container: &ComponentContainer) -> Result<ComponentInstance>;

    /// Release any cached state
    fn dispose(&self) {}
}

/// Where a resolved instance is kept
enum Slot {
    /// Held by the adapter
    Local(Mutex<Option<ComponentInstance>>),
    /// Held as a typed value in a container catalog
    Catalog(CatalogSlot),
}

impl Slot {
    fn local(instance: Option<ComponentInstance>) -> Self {
        Self::Local(Mutex::new(instance))
    }

    fn get(&self) -> Option<ComponentInstance> {
        match self {
            Self::Local(slot) => slot.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            Self::Catalog(slot) => slot.get(),
        }
    }

    fn put(&self, key: &ComponentKey, instance: &ComponentInstance) -> Result<()> {
        match self {
            Self::Local(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(instance.clone());
                Ok(())
            }
            Self::Catalog(slot) => {
                if slot.put(instance) {
                    Ok(())
                } else {
                    Err(Error::type_mismatch(key.to_string(), instance.type_name()))
                }
            }
        }
    }

    fn take(&self) {
        match self {
            Self::Local(slot) => {
                slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            }
            Self::Catalog(slot) => slot.take(),
        }
    }
}

/// Adapter around a value registered up front
pub struct InstanceAdapter {
    key: ComponentKey,
    slot: Slot,
    implementation: &'static str,
}

impl InstanceAdapter {
    pub fn new(key: ComponentKey, instance: ComponentInstance) -> Self {
        Self {
            key,
            implementation: instance.type_name(),
            slot: Slot::local(Some(instance)),
        }
    }

    /// Adapter reading the `Arc<I>` value of `catalog`
    ///
    /// The value itself is added by the container once the key is bound.
    pub(crate) fn cataloged<I>(key: ComponentKey, catalog: Arc<ComponentCatalog>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            key,
            implementation: type_name::<I>(),
            slot: Slot::Catalog(CatalogSlot::of::<I>(catalog)),
        }
    }
}

impl ComponentAdapter for InstanceAdapter {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn implementation(&self) -> &str {
        self.implementation
    }

    fn instance(&self, _container: &ComponentContainer) -> Result<ComponentInstance> {
        self.slot
            .get()
            .ok_or_else(|| Error::illegal_state(format!("Component {} was disposed", self.key)))
    }

    fn dispose(&self) {
        self.slot.take();
    }
}

/// Type-erased constructor: the container plus the resolved parameter instances
pub type Constructor =
    Box<dyn Fn(&ComponentContainer, &[ComponentInstance]) -> Result<ComponentInstance> + Send + Sync>;

/// Singleton adapter that constructs its instance on first resolution
///
/// Explicit parameter keys are resolved in order before the constructor
/// runs. The instance is built at most once per container lifetime.
pub struct CachingAdapter {
    key: ComponentKey,
    implementation: &'static str,
    parameters: Vec<ComponentKey>,
    constructor: Constructor,
    slot: Slot,
    building: Mutex<()>,
}

impl CachingAdapter {
    pub fn new<F>(
        key: ComponentKey,
        implementation: &'static str,
        parameters: Vec<ComponentKey>,
        constructor: F,
    ) -> Self
    where
        F: Fn(&ComponentContainer, &[ComponentInstance]) -> Result<ComponentInstance>
            + Send
            + Sync
            + 'static,
    {
        Self {
            key,
            implementation,
            parameters,
            constructor: Box::new(constructor),
            slot: Slot::local(None),
            building: Mutex::new(()),
        }
    }

    /// Singleton kept as the `Arc<I>` value of `catalog`
    pub(crate) fn cataloged<I, F>(
        key: ComponentKey,
        parameters: Vec<ComponentKey>,
        catalog: Arc<ComponentCatalog>,
        constructor: F,
    ) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&ComponentContainer, &[ComponentInstance]) -> Result<ComponentInstance>
            + Send
            + Sync
            + 'static,
    {
        Self {
            key,
            implementation: type_name::<I>(),
            parameters,
            constructor: Box::new(constructor),
            slot: Slot::Catalog(CatalogSlot::of::<I>(catalog)),
            building: Mutex::new(()),
        }
    }

    /// Explicit constructor parameter keys
    pub fn parameters(&self) -> &[ComponentKey] {
        &self.parameters
    }

    /// Whether the singleton has been built
    pub fn is_instantiated(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl ComponentAdapter for CachingAdapter {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn implementation(&self) -> &str {
        self.implementation
    }

    fn instance(&self, container: &ComponentContainer) -> Result<ComponentInstance> {
        // Enter before locking: a same-thread cycle would otherwise deadlock on the build lock
        let _guard = ResolutionGuard::enter(&self.key)?;
        let _building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = self.slot.get() {
            return Ok(instance);
        }

        let arguments = self
            .parameters
            .iter()
            .map(|key| container.resolve(key))
            .collect::<Result<Vec<_>>>()?;
        let instance = (self.constructor)(container, &arguments)?;
        trace!(key = %self.key, implementation = self.implementation, "Constructed component");
        self.slot.put(&self.key, &instance)?;
        Ok(instance)
    }

    fn dispose(&self) {
        let _building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        self.slot.take();
    }
}

thread_local! {
    static RESOLVING: RefCell<Vec<ComponentKey>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as under construction on the current thread
pub(crate) struct ResolutionGuard;

impl ResolutionGuard {
    pub(crate) fn enter(key: &ComponentKey) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(key) {
                let path = stack
                    .iter()
                    .chain(std::iter::once(key))
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(Error::cyclic_dependency(path));
            }
            stack.push(key.clone());
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Shared handle to an adapter
pub type SharedAdapter = Arc<dyn ComponentAdapter>;
