//! Wrapped Container
//!
//! Holds the currently active container. A deployment-specific
//! [`ContainerProvider`] may decorate it exactly once; the original façade
//! stays reachable for registrars and the exposed-key registry.

use super::container::ComponentContainer;
use super::host_components::ContainerHostComponentProvider;
use arc_swap::ArcSwapOption;
use keel_domain::error::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Decorates a container, typically by layering a child on top of it
pub trait ContainerProvider: Send + Sync {
    /// Build the container that replaces `parent` as the active one
    fn container(&self, parent: Arc<ComponentContainer>) -> Result<Arc<ComponentContainer>>;
}

impl<F> ContainerProvider for F
where
    F: Fn(Arc<ComponentContainer>) -> Result<Arc<ComponentContainer>> + Send + Sync,
{
    fn container(&self, parent: Arc<ComponentContainer>) -> Result<Arc<ComponentContainer>> {
        self(parent)
    }
}

/// Handle on the active container and the façade it was created from
pub struct WrappedComponentContainer {
    facade: ArcSwapOption<ComponentContainer>,
    current: ArcSwapOption<ComponentContainer>,
}

impl WrappedComponentContainer {
    pub fn new(container: Arc<ComponentContainer>) -> Self {
        Self {
            facade: ArcSwapOption::from(Some(Arc::clone(&container))),
            current: ArcSwapOption::from(Some(container)),
        }
    }

    /// The undecorated container registrars populate
    pub fn facade(&self) -> Result<Arc<ComponentContainer>> {
        self.facade.load_full().ok_or_else(disposed)
    }

    /// The active container, decorated if a provider was applied
    pub fn current(&self) -> Result<Arc<ComponentContainer>> {
        self.current.load_full().ok_or_else(disposed)
    }

    /// Replace the active container with the one built by `provider`
    ///
    /// Fails if a decoration was already applied; the existing one is kept.
    /// The provider runs without any lock held, and the swap only happens if
    /// the façade is still the active container, so concurrent callers see
    /// exactly one success.
    pub fn wrap_with(&self, provider: &dyn ContainerProvider) -> Result<()> {
        let facade = self.facade()?;
        if self.is_wrapped() {
            return Err(already_wrapped(&facade));
        }
        let decorated = provider.container(Arc::clone(&facade))?;
        let expected = Some(Arc::clone(&facade));
        let previous = self
            .current
            .compare_and_swap(&expected, Some(Arc::clone(&decorated)));
        match &*previous {
            Some(active) if Arc::ptr_eq(active, &facade) => {
                info!(facade = %facade.name(), container = %decorated.name(), "Wrapped component container");
                Ok(())
            }
            Some(_) => {
                if !Arc::ptr_eq(&decorated, &facade) {
                    decorated.dispose();
                }
                Err(already_wrapped(&facade))
            }
            None => Err(disposed()),
        }
    }

    /// Whether the active container differs from the original façade
    pub fn is_wrapped(&self) -> bool {
        match (&*self.facade.load(), &*self.current.load()) {
            (Some(facade), Some(current)) => !Arc::ptr_eq(facade, current),
            _ => false,
        }
    }

    /// Provider publishing the façade's exposed keys as resolved by the active container
    pub fn host_component_provider(&self) -> Result<ContainerHostComponentProvider> {
        let facade = self.facade()?;
        let current = self.current()?;
        Ok(ContainerHostComponentProvider::new(
            Arc::downgrade(&facade),
            Arc::downgrade(&current),
        ))
    }

    /// Tear down both containers and drop every reference to them
    pub fn dispose(&self) {
        let current = self.current.swap(None);
        let facade = self.facade.swap(None);
        if let Some(current) = &current {
            current.dispose();
        }
        if let Some(facade) = facade {
            if !current.as_ref().is_some_and(|c| Arc::ptr_eq(c, &facade)) {
                facade.dispose();
            }
            debug!(container = %facade.name(), "Released wrapped container");
        }
    }

    /// Whether [`Self::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.facade.load().is_none()
    }
}

fn already_wrapped(facade: &ComponentContainer) -> Error {
    Error::configuration(format!(
        "Container '{}' has already been wrapped",
        facade.name()
    ))
}

fn disposed() -> Error {
    Error::illegal_state("Component container has been disposed")
}
