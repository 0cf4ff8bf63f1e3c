//! Component keys
//!
//! A key is either a type identity or a string. Trait object types
//! (`dyn Trait`) are interface keys and the only keys that may be exposed to
//! the plugin host; sized types are concrete keys usable for internal
//! bindings; string keys carry plain values such as version strings.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Simple names derived from type names, keyed by type
static SIMPLE_NAMES: Lazy<DashMap<TypeId, Arc<str>>> = Lazy::new(DashMap::new);

/// Kind of a [`ComponentKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// A trait object type
    Interface,
    /// A sized type
    Concrete,
    /// A string key
    Named,
}

/// Identity under which a component is registered and resolved
#[derive(Clone)]
pub enum ComponentKey {
    /// Type identity
    Type {
        /// Runtime type id
        id: TypeId,
        /// Full type name as reported by the compiler
        name: &'static str,
    },
    /// String identity
    Named(Arc<str>),
}

impl ComponentKey {
    /// Key for the type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// String key
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::Named(name.into())
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Type { name, .. } if name.starts_with("dyn ") => KeyKind::Interface,
            Self::Type { .. } => KeyKind::Concrete,
            Self::Named(_) => KeyKind::Named,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind() == KeyKind::Interface
    }

    pub fn is_named(&self) -> bool {
        self.kind() == KeyKind::Named
    }

    /// Full type name, or the string for named keys
    pub fn type_name(&self) -> &str {
        match self {
            Self::Type { name, .. } => name,
            Self::Named(name) => name,
        }
    }

    /// Type path without the `dyn` marker or auto-trait bounds
    ///
    /// `dyn keel::Foo + Send + Sync` becomes `keel::Foo`.
    pub fn type_path(&self) -> &str {
        let full = self.type_name();
        let stripped = full.strip_prefix("dyn ").unwrap_or(full);
        stripped.split(" + ").next().unwrap_or(stripped)
    }

    /// Last path segment of the type, without generic arguments
    pub fn simple_name(&self) -> Arc<str> {
        match self {
            Self::Type { id, .. } => SIMPLE_NAMES
                .entry(*id)
                .or_insert_with(|| Arc::from(simple_name_of(self.type_path())))
                .clone(),
            Self::Named(name) => Arc::clone(name),
        }
    }
}

fn simple_name_of(path: &str) -> &str {
    let without_generics = path.split('<').next().unwrap_or(path);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// Drop every cached simple name
pub fn clear_metadata_cache() {
    SIMPLE_NAMES.clear();
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Type { id: a, .. }, Self::Type { id: b, .. }) => a == b,
            (Self::Named(a), Self::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            Self::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { .. } => f.write_str(self.type_path()),
            Self::Named(name) => write!(f, "\"{name}\""),
        }
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKey({self})")
    }
}
