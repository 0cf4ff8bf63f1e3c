//! Multi-Key Registrant
//!
//! Registers one concrete implementation once and makes the same singleton
//! resolvable under several interface keys. The implementation is bound
//! under its own internal key; every interface key is an alias entry that
//! resolves through that primary binding. Every key is checked before the
//! first one is bound, so a rejected registration leaves the container as
//! it was.
//!
//! ```ignore
//! MultipleKeyRegistrant::registrant_for(|_| Ok(Arc::new(DefaultUserManager::new())))
//!     .implementing::<dyn UserManager>(|m| m as Arc<dyn UserManager>)
//!     .implementing_in::<dyn UserLookup>(Scope::Internal, |m| m as Arc<dyn UserLookup>)
//!     .register_with(Scope::Exposed, &container)?;
//! ```

use super::container::{AliasCast, Arguments, ComponentContainer};
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use keel_domain::error::{Error, Result};
use keel_domain::value_objects::Scope;
use std::any::type_name;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

type Registration = Box<dyn FnOnce(&ComponentContainer) -> Result<()> + Send + Sync>;

struct InterfaceBinding {
    key: ComponentKey,
    scope: Option<Scope>,
    cast: AliasCast,
}

/// Builder binding one implementation `T` under several keys
pub struct MultipleKeyRegistrant<T> {
    register_primary: Registration,
    interfaces: Vec<InterfaceBinding>,
    _implementation: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> MultipleKeyRegistrant<T> {
    /// Start a registrant for an implementation built by `factory`
    pub fn registrant_for<F>(factory: F) -> Self
    where
        F: Fn(&ComponentContainer) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::from_registration(Box::new(move |container: &ComponentContainer| {
            container.implementation::<T, _>(Scope::Internal, factory)
        }))
    }

    /// Start a registrant whose constructor arguments are the given keys
    pub fn registrant_with<F>(parameters: Vec<ComponentKey>, factory: F) -> Self
    where
        F: Fn(&Arguments<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::from_registration(Box::new(move |container: &ComponentContainer| {
            container.implementation_with::<T, _>(Scope::Internal, parameters, factory)
        }))
    }

    fn from_registration(register_primary: Registration) -> Self {
        Self {
            register_primary,
            interfaces: Vec::new(),
            _implementation: std::marker::PhantomData,
        }
    }

    /// Also answer to `I`, in the scope given to [`Self::register_with`]
    pub fn implementing<I>(self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.push::<I>(None, cast)
    }

    /// Also answer to `I`, in an explicit scope
    pub fn implementing_in<I>(self, scope: Scope, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.push::<I>(Some(scope), cast)
    }

    fn push<I>(mut self, scope: Option<Scope>, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.interfaces.push(InterfaceBinding {
            key: ComponentKey::of::<I>(),
            scope,
            cast: Arc::new(move |instance: &ComponentInstance| {
                instance
                    .downcast::<T>()
                    .map(|implementation| ComponentInstance::new(cast(implementation)))
            }),
        });
        self
    }

    /// Bind the implementation and every interface key into `container`
    ///
    /// At least one interface must have been added.
    pub fn register_with(self, default_scope: Scope, container: &ComponentContainer) -> Result<()> {
        if self.interfaces.is_empty() {
            return Err(Error::illegal_state(format!(
                "Must call implementing() at least once before registering {}",
                type_name::<T>()
            )));
        }

        let primary = ComponentKey::of::<T>();
        self.check_keys(&primary, default_scope, container)?;
        (self.register_primary)(container)?;
        for interface in self.interfaces {
            let scope = interface.scope.unwrap_or(default_scope);
            debug!(
                implementation = %primary,
                key = %interface.key,
                scope = %scope,
                "Registering alias"
            );
            container.alias(scope, interface.key, primary.clone(), interface.cast)?;
        }
        Ok(())
    }

    /// Validate every key up front so a rejected registration binds nothing
    fn check_keys(
        &self,
        primary: &ComponentKey,
        default_scope: Scope,
        container: &ComponentContainer,
    ) -> Result<()> {
        container.check_bindable(Scope::Internal, primary)?;
        let mut seen = HashSet::from([primary]);
        for interface in &self.interfaces {
            if !seen.insert(&interface.key) {
                return Err(Error::configuration(format!(
                    "{} is listed more than once for {}",
                    interface.key,
                    type_name::<T>()
                )));
            }
            container.check_bindable(interface.scope.unwrap_or(default_scope), &interface.key)?;
        }
        Ok(())
    }
}
