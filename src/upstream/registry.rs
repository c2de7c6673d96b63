//! Backend registry.
//!
//! # Responsibilities
//! - Index declared backends by their BackendRef
//! - Resolve a routing decision to a concrete address

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::upstream::{Backend, BackendRef};
use crate::config::BackendConfig;

/// Immutable map of BackendRef -> Backend.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<BackendRef, Arc<Backend>>,
}

impl BackendRegistry {
    /// Build the registry from configuration.
    ///
    /// Entries with unparseable addresses are skipped with a warning; validation
    /// rejects them before a config is accepted.
    pub fn new(configs: &[BackendConfig]) -> Self {
        let mut backends = BTreeMap::new();

        for config in configs {
            let reference = config.backend_ref();
            let backend = config
                .address
                .parse::<SocketAddr>()
                .ok()
                .and_then(|addr| Backend::new(reference.clone(), addr));

            match backend {
                Some(backend) => {
                    backends.insert(reference, Arc::new(backend));
                }
                None => {
                    tracing::warn!(backend = %reference, address = %config.address, "Invalid backend address");
                }
            }
        }

        Self { backends }
    }

    /// Look up a backend.
    pub fn get(&self, reference: &BackendRef) -> Option<Arc<Backend>> {
        self.backends.get(reference).cloned()
    }

    /// All backends in identifier order.
    pub fn all_backends(&self) -> impl Iterator<Item = &Arc<Backend>> {
        self.backends.values()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(name: &str, address: &str) -> BackendConfig {
        BackendConfig {
            name: name.into(),
            namespace: "infra".into(),
            address: address.into(),
        }
    }

    #[test]
    fn test_lookup_by_reference() {
        let registry = BackendRegistry::new(&[
            backend("v1", "127.0.0.1:3001"),
            backend("v2", "127.0.0.1:3002"),
            backend("broken", "not-an-address"),
        ]);

        assert_eq!(registry.len(), 2);
        let v2 = registry.get(&BackendRef::new("v2", "infra")).unwrap();
        assert_eq!(v2.addr.port(), 3002);
        assert!(registry.get(&BackendRef::new("v2", "other")).is_none());
        assert!(registry.get(&BackendRef::new("broken", "infra")).is_none());
    }
}
