//! Upstream backend subsystem.
//!
//! # Data Flow
//! ```text
//! BackendConfig[]
//!     → registry.rs (parse addresses, index by BackendRef)
//!     → BackendRegistry (part of the gateway snapshot)
//!
//! Request dispatch:
//!     MatchResult.backend (BackendRef)
//!     → registry lookup
//!     → Backend (address + in-flight accounting)
//! ```
//!
//! # Design Decisions
//! - A BackendRef is an opaque identifier; the router never looks inside it
//! - Addresses are resolved once per snapshot, not per request

pub mod backend;
pub mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use backend::{Backend, InFlightGuard};
pub use registry::BackendRegistry;

/// Destination identifier for matched traffic (name + namespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackendRef {
    pub name: String,
    #[serde(default = "crate::config::schema::default_namespace")]
    pub namespace: String,
}

impl BackendRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
