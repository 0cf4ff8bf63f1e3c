//! Boundary component lookup
//!
//! Legacy call sites that cannot be handed the [`ComponentManager`] look it
//! up here. The application root installs the manager once it is built and
//! uninstalls it on shutdown. Nothing inside this crate uses the slot.

use crate::lifecycle::ComponentManager;
use arc_swap::ArcSwapOption;
use keel_domain::error::{Error, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;

static MANAGER: Lazy<ArcSwapOption<ComponentManager>> = Lazy::new(ArcSwapOption::empty);

/// Make `manager` reachable through [`component`]; replaces any previous one
pub fn install(manager: Arc<ComponentManager>) {
    MANAGER.store(Some(manager));
}

/// Remove the installed manager, returning it
pub fn uninstall() -> Option<Arc<ComponentManager>> {
    MANAGER.swap(None)
}

/// The installed manager
pub fn manager() -> Result<Arc<ComponentManager>> {
    MANAGER
        .load_full()
        .ok_or_else(|| Error::illegal_state("No component manager is installed"))
}

/// Resolve `I` through the installed manager
pub fn component<I>() -> Result<Arc<I>>
where
    I: ?Sized + Send + Sync + 'static,
{
    manager()?.get::<I>()
}
