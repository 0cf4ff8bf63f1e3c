//! Host component publishing
//!
//! Hands every exposed (instance, bean name, interface) triple to the
//! external plugin host. Bean names are the interface's simple name with a
//! lower-cased first letter; collisions within one batch are configuration
//! errors unless an alias override applies.

use super::container::ComponentContainer;
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use crate::config::ContainerConfig;
use keel_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// One component as seen by the plugin host
#[derive(Debug, Clone)]
pub struct HostComponent {
    pub bean_name: String,
    pub interface: ComponentKey,
    pub instance: ComponentInstance,
}

/// Receives host components from a [`HostComponentProvider`]
pub trait HostComponentRegistrar {
    fn register(&mut self, component: HostComponent) -> Result<()>;
}

impl HostComponentRegistrar for Vec<HostComponent> {
    fn register(&mut self, component: HostComponent) -> Result<()> {
        self.push(component);
        Ok(())
    }
}

/// Publishes components to the plugin host
pub trait HostComponentProvider: Send + Sync {
    fn provide(&self, registrar: &mut dyn HostComponentRegistrar) -> Result<()>;
}

/// Lower-camel-case bean name for an interface
///
/// `IssueManager` becomes `issueManager`.
pub fn bean_name(interface: &ComponentKey) -> String {
    let simple = interface.simple_name();
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Assigns bean names within one publishing batch
pub struct BeanNames<'a> {
    config: &'a ContainerConfig,
    assigned: HashMap<String, ComponentKey>,
}

impl<'a> BeanNames<'a> {
    pub fn new(config: &'a ContainerConfig) -> Self {
        Self {
            config,
            assigned: HashMap::new(),
        }
    }

    /// Name for `interface`, failing if another interface already holds it
    pub fn assign(&mut self, interface: &ComponentKey) -> Result<String> {
        let name = match self.config.bean_name_alias(interface.type_path()) {
            Some(alias) => alias.to_string(),
            None => bean_name(interface),
        };
        if let Some(holder) = self.assigned.get(&name) {
            return Err(Error::configuration(format!(
                "Bean name '{name}' for {interface} is already used by {holder}; \
                 add a bean name alias for one of them"
            )));
        }
        self.assigned.insert(name.clone(), interface.clone());
        Ok(name)
    }
}

/// [`HostComponentProvider`] backed by a container's scoped registry
///
/// Holds weak references so that publishing never keeps a disposed
/// container alive.
#[derive(Clone)]
pub struct ContainerHostComponentProvider {
    registry_owner: Weak<ComponentContainer>,
    resolver: Weak<ComponentContainer>,
}

impl ContainerHostComponentProvider {
    pub(crate) fn new(
        registry_owner: Weak<ComponentContainer>,
        resolver: Weak<ComponentContainer>,
    ) -> Self {
        Self {
            registry_owner,
            resolver,
        }
    }

    fn containers(&self) -> Result<(Arc<ComponentContainer>, Arc<ComponentContainer>)> {
        self.registry_owner
            .upgrade()
            .zip(self.resolver.upgrade())
            .ok_or_else(|| Error::illegal_state("Component container has been disposed"))
    }

    /// Every host component, in exposure order
    pub fn host_components(&self) -> Result<Vec<HostComponent>> {
        let mut published = Vec::new();
        self.provide(&mut published)?;
        Ok(published)
    }
}

impl HostComponentProvider for ContainerHostComponentProvider {
    fn provide(&self, registrar: &mut dyn HostComponentRegistrar) -> Result<()> {
        let (owner, resolver) = self.containers()?;
        let config = owner.config();
        let components = owner
            .registry()
            .components(&resolver, config.unresolved_exposed)?;

        let mut names = BeanNames::new(config);
        for component in components {
            for interface in component.interfaces() {
                let bean_name = names.assign(interface)?;
                debug!(bean = %bean_name, interface = %interface, "Publishing host component");
                registrar.register(HostComponent {
                    bean_name,
                    interface: interface.clone(),
                    instance: component.instance().clone(),
                })?;
            }
        }
        Ok(())
    }
}
