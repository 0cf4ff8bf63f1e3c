//! Resolved component instances
//!
//! Instances are stored type-erased. Identity is the address of the shared
//! allocation, so an `Arc<FooImpl>` and the `Arc<dyn Foo>` made from it are
//! the same instance.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Identity of a component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Identity of the value behind `value`
    pub fn of<T: ?Sized>(value: &Arc<T>) -> Self {
        Self(Arc::as_ptr(value).cast::<()>() as usize)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A type-erased, shareable component instance
#[derive(Clone)]
pub struct ComponentInstance {
    value: Arc<dyn Any + Send + Sync>,
    id: InstanceId,
    type_name: &'static str,
}

impl ComponentInstance {
    /// Wrap a shared value
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            id: InstanceId::of(&value),
            type_name: type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Type the instance was stored as
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The instance as `Arc<T>`, if it was stored as that type
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        (*self.value).downcast_ref::<Arc<T>>().cloned()
    }

    /// Whether both handles point at the same underlying value
    pub fn same_instance(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}
