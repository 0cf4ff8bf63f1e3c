//! Binding scope

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a registered binding
///
/// Every registration declares exactly one scope. Exposed bindings are
/// advertised to the external plugin host; internal bindings are only
/// resolvable inside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Visible to, and importable by, the plugin host
    Exposed,
    /// Resolvable only within the core process
    Internal,
}

impl Scope {
    /// Whether bindings in this scope are published to the plugin host
    pub fn is_exposed(self) -> bool {
        matches!(self, Self::Exposed)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exposed => write!(f, "exposed"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
