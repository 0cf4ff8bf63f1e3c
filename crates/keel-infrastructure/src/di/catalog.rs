//! dill Catalog - typed singleton storage
//!
//! Every container owns a [`ComponentCatalog`]. Values bound under a type key
//! (`instance::<dyn Foo>`, `implementation::<dyn Foo, _>`) are kept in it as
//! `Arc<I>` values once they exist. The catalog is rebuilt lazily: a change
//! marks it stale, and the next lookup builds a fresh [`dill::Catalog`] from
//! the recorded values.
//!
//! ```text
//! register / construct      ComponentCatalog            dill Catalog
//! ──────────────────────    ─────────────────────      ──────────────
//! add_value(Arc<I>)   ───►  TypeId -> registration ──► CatalogBuilder
//!                                                        .add_value(..)
//! get::<Arc<I>>()     ◄───  built on demand       ◄─── get_one::<Arc<I>>()
//! ```

use super::instance::ComponentInstance;
use dill::{Catalog, CatalogBuilder};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

type Registration = Box<dyn Fn(&mut CatalogBuilder) + Send + Sync>;

#[derive(Default)]
struct CatalogState {
    registrations: HashMap<TypeId, Registration>,
    built: Option<Arc<Catalog>>,
}

/// Mutable front of a dill catalog, one value per type
#[derive(Default)]
pub struct ComponentCatalog {
    state: Mutex<CatalogState>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as the single value of type `T`, replacing any previous one
    pub fn add_value<T>(&self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.registrations.insert(
            TypeId::of::<T>(),
            Box::new(move |builder: &mut CatalogBuilder| {
                builder.add_value(value.clone());
            }),
        );
        state.built = None;
    }

    /// The value of type `T`, if one was added
    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.contains::<T>() {
            return None;
        }
        self.catalog().get_one::<T>().ok().map(|value| T::clone(&value))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registrations
            .contains_key(&TypeId::of::<T>())
    }

    /// Forget the value of type `T`
    pub fn remove<T: 'static>(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.registrations.remove(&TypeId::of::<T>()).is_some() {
            state.built = None;
        }
    }

    /// Forget every value
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.registrations.clear();
        state.built = None;
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .registrations
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn catalog(&self) -> Arc<Catalog> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = &state.built {
            return Arc::clone(catalog);
        }
        let mut builder = CatalogBuilder::new();
        for register in state.registrations.values() {
            register(&mut builder);
        }
        let catalog = Arc::new(builder.build());
        trace!(values = state.registrations.len(), "Rebuilt component catalog");
        state.built = Some(Arc::clone(&catalog));
        catalog
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("values", &self.len())
            .finish()
    }
}

/// Typed access to the `Arc<I>` slot of one catalog, erased behind fn pointers
#[derive(Clone)]
pub(crate) struct CatalogSlot {
    catalog: Arc<ComponentCatalog>,
    lookup: fn(&ComponentCatalog) -> Option<ComponentInstance>,
    store: fn(&ComponentCatalog, &ComponentInstance) -> bool,
    remove: fn(&ComponentCatalog),
}

impl CatalogSlot {
    pub(crate) fn of<I>(catalog: Arc<ComponentCatalog>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        Self {
            catalog,
            lookup: |catalog: &ComponentCatalog| {
                catalog.get::<Arc<I>>().map(ComponentInstance::new)
            },
            store: |catalog: &ComponentCatalog, instance: &ComponentInstance| {
                match instance.downcast::<I>() {
                    Some(value) => {
                        catalog.add_value(value);
                        true
                    }
                    None => false,
                }
            },
            remove: |catalog: &ComponentCatalog| catalog.remove::<Arc<I>>(),
        }
    }

    pub(crate) fn get(&self) -> Option<ComponentInstance> {
        (self.lookup)(&self.catalog)
    }

    /// Store `instance`; false when it is not an `Arc<I>`
    pub(crate) fn put(&self, instance: &ComponentInstance) -> bool {
        (self.store)(&self.catalog, instance)
    }

    pub(crate) fn take(&self) {
        (self.remove)(&self.catalog);
    }
}
