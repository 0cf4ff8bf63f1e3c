//! Plugin system collaborators
//!
//! Minimal implementations of the plugin-facing contracts for hosts that
//! ship their plugin set at build time, and for tests.

use crate::di::{ComponentModuleDescriptor, PluginAccessor};
use keel_domain::error::Result;
use keel_domain::ports::PluginSystemLifecycle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Plugin accessor over a fixed list of descriptors
#[derive(Default)]
pub struct StaticPluginAccessor {
    descriptors: RwLock<Vec<Arc<dyn ComponentModuleDescriptor>>>,
}

impl StaticPluginAccessor {
    pub fn new(descriptors: Vec<Arc<dyn ComponentModuleDescriptor>>) -> Self {
        Self {
            descriptors: RwLock::new(descriptors),
        }
    }

    /// Enable another descriptor
    pub fn enable(&self, descriptor: Arc<dyn ComponentModuleDescriptor>) {
        debug!(plugin = descriptor.plugin_key(), "Enabled component module");
        self.descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(descriptor);
    }
}

impl PluginAccessor for StaticPluginAccessor {
    fn enabled_component_descriptors(&self) -> Vec<Arc<dyn ComponentModuleDescriptor>> {
        self.descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Plugin system that only tracks whether it is running
#[derive(Debug, Default)]
pub struct NullPluginSystem {
    running: AtomicBool,
}

impl NullPluginSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl PluginSystemLifecycle for NullPluginSystem {
    fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}
