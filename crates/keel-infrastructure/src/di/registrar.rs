//! Registration contracts
//!
//! A [`ContainerRegistrar`] populates a container during one of the three
//! bring-up phases. Plugin-supplied registrations arrive as
//! [`ComponentModuleDescriptor`]s through the [`PluginAccessor`].

use super::container::ComponentContainer;
use keel_domain::error::Result;
use std::sync::Arc;

/// Populates a container for one lifecycle phase
pub trait ContainerRegistrar: Send + Sync {
    fn register_components(&self, container: &ComponentContainer) -> Result<()>;
}

impl<F> ContainerRegistrar for F
where
    F: Fn(&ComponentContainer) -> Result<()> + Send + Sync,
{
    fn register_components(&self, container: &ComponentContainer) -> Result<()> {
        self(container)
    }
}

/// Registrar that adds nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistrar;

impl ContainerRegistrar for NoopRegistrar {
    fn register_components(&self, _container: &ComponentContainer) -> Result<()> {
        Ok(())
    }
}

/// Components contributed by an enabled plugin module
pub trait ComponentModuleDescriptor: Send + Sync {
    /// Key of the plugin module, used in logs and error messages
    fn plugin_key(&self) -> &str;

    /// Register the module's components into the full container
    fn register_components(&self, container: &ComponentContainer) -> Result<()>;
}

/// Source of the enabled plugin component descriptors
pub trait PluginAccessor: Send + Sync {
    fn enabled_component_descriptors(&self) -> Vec<Arc<dyn ComponentModuleDescriptor>>;
}
