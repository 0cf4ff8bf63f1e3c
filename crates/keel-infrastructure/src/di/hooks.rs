//! Lifecycle hook table
//!
//! Registrars list the components that take part in the lifecycle: which
//! need the after-instantiation callback, which are started with the
//! manager and which subscribe to the event bus. The component manager walks
//! these lists in registration order.

use super::container::ComponentContainer;
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use keel_domain::error::{Error, Result};
use keel_domain::ports::{EventListener, InitializingComponent, Startable};
use std::any::type_name;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

type HookCast<H> = Arc<dyn Fn(&ComponentInstance) -> Option<Arc<H>> + Send + Sync>;

/// One component listed for a lifecycle hook
pub struct HookEntry<H: ?Sized> {
    key: ComponentKey,
    cast: HookCast<H>,
}

impl<H: ?Sized> Clone for HookEntry<H> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            cast: Arc::clone(&self.cast),
        }
    }
}

impl<H: ?Sized + 'static> HookEntry<H> {
    fn new<I, F>(cast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<H> + Send + Sync + 'static,
    {
        Self {
            key: ComponentKey::of::<I>(),
            cast: Arc::new(move |instance: &ComponentInstance| {
                instance.downcast::<I>().map(&cast)
            }),
        }
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Resolve the component and view it through the hook contract
    pub fn resolve(&self, container: &ComponentContainer) -> Result<(ComponentInstance, Arc<H>)> {
        let instance = container.resolve(&self.key)?;
        let hook = (self.cast)(&instance)
            .ok_or_else(|| Error::type_mismatch(self.key.to_string(), type_name::<H>()))?;
        Ok((instance, hook))
    }
}

/// Hook lists of one container
#[derive(Default)]
pub struct ComponentHooks {
    initializing: RwLock<Vec<HookEntry<dyn InitializingComponent>>>,
    startable: RwLock<Vec<HookEntry<dyn Startable>>>,
    listeners: RwLock<Vec<HookEntry<dyn EventListener>>>,
}

/// Snapshot of the hook lists, parent containers first
#[derive(Default, Clone)]
pub struct HookTable {
    pub initializing: Vec<HookEntry<dyn InitializingComponent>>,
    pub startable: Vec<HookEntry<dyn Startable>>,
    pub listeners: Vec<HookEntry<dyn EventListener>>,
}

fn push<H: ?Sized>(list: &RwLock<Vec<HookEntry<H>>>, entry: HookEntry<H>, hook: &str) {
    let mut list = list.write().unwrap_or_else(PoisonError::into_inner);
    if list.iter().any(|existing| existing.key == entry.key) {
        debug!(key = %entry.key, hook, "Component already listed for hook");
        return;
    }
    debug!(key = %entry.key, hook, "Listed component for hook");
    list.push(entry);
}

fn snapshot<H: ?Sized>(list: &RwLock<Vec<HookEntry<H>>>) -> Vec<HookEntry<H>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

impl ComponentHooks {
    /// Call `after_instantiation` on the component bound to `T`
    pub fn initializing<T>(&self)
    where
        T: InitializingComponent + 'static,
    {
        self.initializing_as::<T, _>(|component: Arc<T>| -> Arc<dyn InitializingComponent> {
            component
        });
    }

    /// Call `after_instantiation` on the component bound to `I`, viewed through `cast`
    pub fn initializing_as<I, F>(&self, cast: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<dyn InitializingComponent> + Send + Sync + 'static,
    {
        push(&self.initializing, HookEntry::new(cast), "initializing");
    }

    /// Start the component bound to `T` with the manager
    pub fn startable<T>(&self)
    where
        T: Startable + 'static,
    {
        self.startable_as::<T, _>(|component: Arc<T>| -> Arc<dyn Startable> { component });
    }

    /// Start the component bound to `I`, viewed through `cast`
    pub fn startable_as<I, F>(&self, cast: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<dyn Startable> + Send + Sync + 'static,
    {
        push(&self.startable, HookEntry::new(cast), "startable");
    }

    /// Subscribe the component bound to `T` to the event bus
    pub fn event_listener<T>(&self)
    where
        T: EventListener + 'static,
    {
        self.event_listener_as::<T, _>(|component: Arc<T>| -> Arc<dyn EventListener> {
            component
        });
    }

    /// Subscribe the component bound to `I`, viewed through `cast`
    pub fn event_listener_as<I, F>(&self, cast: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<dyn EventListener> + Send + Sync + 'static,
    {
        push(&self.listeners, HookEntry::new(cast), "event_listener");
    }

    pub(crate) fn extend_table(&self, table: &mut HookTable) {
        table.initializing.extend(snapshot(&self.initializing));
        table.startable.extend(snapshot(&self.startable));
        table.listeners.extend(snapshot(&self.listeners));
    }

    pub(crate) fn clear(&self) {
        self.initializing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.startable
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
