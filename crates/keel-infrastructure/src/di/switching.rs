//! Switching adapters
//!
//! A switching binding answers to one interface key but picks between two
//! candidates when resolved. [`SwitchingAdapter`] evaluates its predicate on
//! every resolution; [`ResolvedOnceSwitchingAdapter`] asks its condition
//! once and sticks with the answer until the container is disposed.
//!
//! Callers see the chosen candidate's instance directly, so the interface
//! contract is exactly that of the implementation.

use super::adapter::ComponentAdapter;
use super::container::ComponentContainer;
use super::instance::ComponentInstance;
use super::key::ComponentKey;
use keel_domain::error::{Error, Result};
use std::any::type_name;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

type CandidateCast<I> = Arc<dyn Fn(&ComponentInstance) -> Option<Arc<I>> + Send + Sync>;

enum CandidateSource<I: ?Sized> {
    /// Resolve a registered key and view it as `I`
    Key {
        key: ComponentKey,
        cast: CandidateCast<I>,
    },
    /// A fixed value
    Instance(Arc<I>),
}

/// One side of a switching binding
pub struct Candidate<I: ?Sized> {
    source: CandidateSource<I>,
}

impl<I: ?Sized + Send + Sync + 'static> Candidate<I> {
    /// The component registered under `T`, viewed as `I`
    pub fn implementation<T>(cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            source: CandidateSource::Key {
                key: ComponentKey::of::<T>(),
                cast: Arc::new(move |instance: &ComponentInstance| {
                    instance.downcast::<T>().map(cast)
                }),
            },
        }
    }

    /// The component registered under `key`, which must already be an `Arc<I>`
    pub fn key(key: ComponentKey) -> Self {
        Self {
            source: CandidateSource::Key {
                key,
                cast: Arc::new(|instance: &ComponentInstance| instance.downcast::<I>()),
            },
        }
    }

    /// A fixed value
    pub fn instance(value: Arc<I>) -> Self {
        Self {
            source: CandidateSource::Instance(value),
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            CandidateSource::Key { key, .. } => key.to_string(),
            CandidateSource::Instance(_) => format!("instance of {}", type_name::<I>()),
        }
    }

    fn resolve(&self, container: &ComponentContainer) -> Result<Arc<I>> {
        match &self.source {
            CandidateSource::Key { key, cast } => {
                let instance = container.resolve(key)?;
                cast(&instance)
                    .ok_or_else(|| Error::type_mismatch(key.to_string(), type_name::<I>()))
            }
            CandidateSource::Instance(value) => Ok(Arc::clone(value)),
        }
    }
}

/// Switching binding that re-evaluates its predicate on every resolution
///
/// Suited to conditions that change during the process lifetime, such as
/// a bulk import being in progress.
pub struct SwitchingAdapter<I: ?Sized> {
    key: ComponentKey,
    implementation: String,
    enabled: Candidate<I>,
    disabled: Candidate<I>,
    predicate: Box<dyn Fn() -> bool + Send + Sync>,
}

impl<I: ?Sized + Send + Sync + 'static> SwitchingAdapter<I> {
    /// `enabled` while `predicate` holds, `disabled` otherwise
    pub fn new<P>(enabled: Candidate<I>, disabled: Candidate<I>, predicate: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            key: ComponentKey::of::<I>(),
            implementation: format!("switch({} | {})", enabled.describe(), disabled.describe()),
            enabled,
            disabled,
            predicate: Box::new(predicate),
        }
    }
}

impl<I: ?Sized + Send + Sync + 'static> ComponentAdapter for SwitchingAdapter<I> {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn implementation(&self) -> &str {
        &self.implementation
    }

    fn instance(&self, container: &ComponentContainer) -> Result<ComponentInstance> {
        let candidate = if (self.predicate)() {
            &self.enabled
        } else {
            &self.disabled
        };
        candidate.resolve(container).map(ComponentInstance::new)
    }
}

/// Switching binding whose condition is evaluated once per container
///
/// Suited to conditions that are fixed for the life of a container but not
/// known at registration time, such as whether the database is configured.
pub struct ResolvedOnceSwitchingAdapter<I: ?Sized> {
    key: ComponentKey,
    implementation: String,
    enabled: Candidate<I>,
    disabled: Candidate<I>,
    condition: Box<dyn Fn(&ComponentContainer) -> Result<bool> + Send + Sync>,
    decision: Mutex<Option<bool>>,
}

impl<I: ?Sized + Send + Sync + 'static> ResolvedOnceSwitchingAdapter<I> {
    /// `enabled` if `condition` holds on first resolution, `disabled` otherwise
    pub fn new<C>(enabled: Candidate<I>, disabled: Candidate<I>, condition: C) -> Self
    where
        C: Fn(&ComponentContainer) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            key: ComponentKey::of::<I>(),
            implementation: format!("switch-once({} | {})", enabled.describe(), disabled.describe()),
            enabled,
            disabled,
            condition: Box::new(condition),
            decision: Mutex::new(None),
        }
    }

    /// The recorded decision, if the condition has been evaluated
    pub fn decision(&self) -> Option<bool> {
        *self.decision.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I: ?Sized + Send + Sync + 'static> ComponentAdapter for ResolvedOnceSwitchingAdapter<I> {
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    fn implementation(&self) -> &str {
        &self.implementation
    }

    fn instance(&self, container: &ComponentContainer) -> Result<ComponentInstance> {
        let enabled = match self.decision() {
            Some(enabled) => enabled,
            None => {
                // Evaluated outside the lock; the first recorded answer wins
                let evaluated = (self.condition)(container)?;
                let mut decision = self.decision.lock().unwrap_or_else(PoisonError::into_inner);
                let enabled = *decision.get_or_insert(evaluated);
                debug!(key = %self.key, enabled, "Resolved switching condition");
                enabled
            }
        };
        let candidate = if enabled { &self.enabled } else { &self.disabled };
        candidate.resolve(container).map(ComponentInstance::new)
    }

    fn dispose(&self) {
        self.decision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
