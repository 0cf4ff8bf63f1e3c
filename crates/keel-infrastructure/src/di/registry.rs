//! Scoped Registry
//!
//! Tracks which interface keys are exposed to the external plugin host.
//! Keys are appended during registration and published as [`Component`]s,
//! grouped by instance identity.

use super::adapter::ComponentAdapter;
use super::container::ComponentContainer;
use super::instance::{ComponentInstance, InstanceId};
use super::key::ComponentKey;
use crate::config::UnresolvedExposedPolicy;
use keel_domain::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// A published instance together with every exposed interface it answers to
///
/// Equality is identity of the instance.
#[derive(Debug, Clone)]
pub struct Component {
    instance: ComponentInstance,
    interfaces: Vec<ComponentKey>,
}

impl Component {
    pub fn instance(&self) -> &ComponentInstance {
        &self.instance
    }

    /// Exposed interfaces in registration order
    pub fn interfaces(&self) -> &[ComponentKey] {
        &self.interfaces
    }

    pub fn exposes(&self, key: &ComponentKey) -> bool {
        self.interfaces.contains(key)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.instance.same_instance(&other.instance)
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance.id().hash(state);
    }
}

#[derive(Default)]
struct ExposedKeys {
    order: Vec<ComponentKey>,
    set: HashSet<ComponentKey>,
}

/// Registry of exposed interface keys for one container
#[derive(Default)]
pub struct ScopedRegistry {
    exposed: RwLock<ExposedKeys>,
}

impl ScopedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose an interface key
    ///
    /// Fails without mutating the registry when the key is not an interface
    /// or was exposed before.
    pub fn register(&self, key: &ComponentKey) -> Result<()> {
        if !key.is_interface() {
            return Err(Error::configuration(format!(
                "{key} must be an interface to expose"
            )));
        }
        let mut exposed = self.exposed.write().unwrap_or_else(PoisonError::into_inner);
        if exposed.set.contains(key) {
            return Err(Error::configuration(format!("{key} has already been exposed")));
        }
        exposed.set.insert(key.clone());
        exposed.order.push(key.clone());
        debug!(key = %key, "Exposed component key");
        Ok(())
    }

    /// Expose the key of an adapter; string keys are never exposed
    pub fn register_adapter(&self, adapter: &dyn ComponentAdapter) -> Result<()> {
        self.expose(adapter.key())
    }

    pub(crate) fn expose(&self, key: &ComponentKey) -> Result<()> {
        if key.is_named() {
            debug!(key = %key, "String keys are not exposed");
            return Ok(());
        }
        self.register(key)
    }

    pub fn is_exposed(&self, key: &ComponentKey) -> bool {
        self.exposed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set
            .contains(key)
    }

    /// Exposed keys in registration order
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.exposed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    pub fn len(&self) -> usize {
        self.exposed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&self) {
        let mut exposed = self.exposed.write().unwrap_or_else(PoisonError::into_inner);
        exposed.order.clear();
        exposed.set.clear();
    }

    /// Resolve every exposed key and group the interfaces by instance
    ///
    /// Keys without an instance are handled according to `policy`.
    pub fn components(
        &self,
        resolver: &ComponentContainer,
        policy: UnresolvedExposedPolicy,
    ) -> Result<Vec<Component>> {
        let mut components: Vec<Component> = Vec::new();
        let mut by_instance: HashMap<InstanceId, usize> = HashMap::new();

        for key in self.keys() {
            let Some(instance) = resolver.try_resolve(&key)? else {
                match policy {
                    UnresolvedExposedPolicy::Warn => {
                        warn!(key = %key, "Exposed component has no instance; not published");
                        continue;
                    }
                    UnresolvedExposedPolicy::Fail => {
                        return Err(Error::configuration(format!(
                            "Exposed component {key} has no resolvable instance"
                        )));
                    }
                }
            };
            match by_instance.get(&instance.id()) {
                Some(&index) => components[index].interfaces.push(key),
                None => {
                    by_instance.insert(instance.id(), components.len());
                    components.push(Component {
                        instance,
                        interfaces: vec![key],
                    });
                }
            }
        }
        Ok(components)
    }
}
