//! Lifecycle participation contracts

use crate::error::Result;

/// A component with work to do when the manager starts
pub trait Startable: Send + Sync {
    /// Start the component
    ///
    /// An error aborts the whole bring-up.
    fn start(&self) -> Result<()>;
}

/// A component that needs a callback once the container has been populated
pub trait InitializingComponent: Send + Sync {
    /// Invoked after every registrar has run and before the manager starts
    fn after_instantiation(&self) -> Result<()>;
}

/// Lifecycle of the plugin system
///
/// The component manager drives this contract itself, so implementations
/// are never started a second time through [`Startable`].
pub trait PluginSystemLifecycle: Send + Sync {
    /// Start the plugin system
    fn start(&self) -> Result<()>;

    /// Shut the plugin system down
    fn shutdown(&self) -> Result<()>;
}
