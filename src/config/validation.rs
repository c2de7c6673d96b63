//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rules reference declared backends)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject malformed or contradictory match predicates
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, MatchConfig};
use crate::routing::matcher::{HostMatch, PredicateError, RequestMatch};
use crate::routing::RouteKey;
use crate::upstream::BackendRef;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate route {0}")]
    DuplicateRoute(RouteKey),

    #[error("route {route}: {source}")]
    InvalidHostname { route: RouteKey, source: PredicateError },

    #[error("route {route}, rule {rule}, match {index}: {source}")]
    InvalidMatch {
        route: RouteKey,
        rule: usize,
        index: usize,
        source: PredicateError,
    },

    #[error("{referrer} references undeclared backend {backend}")]
    UnknownBackend { referrer: String, backend: BackendRef },

    #[error("duplicate backend {0}")]
    DuplicateBackend(BackendRef),

    #[error("backend {backend}: invalid address '{address}'")]
    InvalidBackendAddress { backend: BackendRef, address: String },

    #[error("{field}: invalid bind address '{address}'")]
    InvalidBindAddress { field: &'static str, address: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_addresses(config, &mut errors);
    let declared = validate_backends(config, &mut errors);
    validate_routes(config, &declared, &mut errors);

    if let Some(backend) = &config.matching.default_backend {
        if !declared.contains(backend) {
            errors.push(ValidationError::UnknownBackend {
                referrer: "matching.default_backend".to_string(),
                backend: backend.clone(),
            });
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_addresses(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut check = |field: &'static str, address: &str| {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                field,
                address: address.to_string(),
            });
        }
    };

    check("listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check("admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check("observability.metrics_address", &config.observability.metrics_address);
    }
}

fn validate_backends(config: &GatewayConfig, errors: &mut Vec<ValidationError>) -> BTreeSet<BackendRef> {
    let mut declared = BTreeSet::new();

    for backend in &config.backends {
        let reference = backend.backend_ref();
        if backend.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBackendAddress {
                backend: reference.clone(),
                address: backend.address.clone(),
            });
        }
        if !declared.insert(reference.clone()) {
            errors.push(ValidationError::DuplicateBackend(reference));
        }
    }

    declared
}

fn validate_routes(config: &GatewayConfig, declared: &BTreeSet<BackendRef>, errors: &mut Vec<ValidationError>) {
    let mut seen = BTreeSet::new();

    for route in &config.routes {
        let key = RouteKey::new(route.namespace.clone(), route.name.clone());
        if !seen.insert(key.clone()) {
            errors.push(ValidationError::DuplicateRoute(key.clone()));
        }

        for hostname in &route.hostnames {
            if let Err(source) = HostMatch::parse(hostname) {
                errors.push(ValidationError::InvalidHostname {
                    route: key.clone(),
                    source,
                });
            }
        }

        for (rule_index, rule) in route.rules.iter().enumerate() {
            let backend = rule.backend.resolve(&route.namespace);
            if !declared.contains(&backend) {
                errors.push(ValidationError::UnknownBackend {
                    referrer: format!("route {} rule {}", key, rule_index),
                    backend,
                });
            }

            for (index, m) in rule.matches.iter().enumerate() {
                if let Err(source) = validate_match(m) {
                    errors.push(ValidationError::InvalidMatch {
                        route: key.clone(),
                        rule: rule_index,
                        index,
                        source,
                    });
                }
            }
        }
    }
}

fn validate_match(config: &MatchConfig) -> Result<(), PredicateError> {
    RequestMatch::compile(config).map(|_| ())
}
