//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::upstream::BackendRef;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to backends.
    pub routes: Vec<RouteConfig>,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,

    /// Precedence policy and fallback behaviour of the route matcher.
    pub matching: MatchingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,

    /// Maximum request body size forwarded upstream, in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// A route: named collection of rules plus hostname bindings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route name, unique within its namespace.
    pub name: String,

    /// Route namespace.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Hostnames this route is attached to. Empty means any host.
    #[serde(default)]
    pub hostnames: Vec<String>,

    /// Tie-break priority (higher = preferred when specificity is equal).
    #[serde(default)]
    pub priority: u32,

    /// Ordered rules.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

pub(crate) fn default_namespace() -> String {
    "default".to_string()
}

/// A rule: one or more alternative matches and the backend they route to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuleConfig {
    /// Alternative matches (OR). Empty means a single `PathPrefix "/"` match.
    #[serde(default)]
    pub matches: Vec<MatchConfig>,

    /// Target backend.
    pub backend: BackendRefConfig,
}

/// A single match predicate (path AND headers).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Path predicate. Absent means `PathPrefix "/"`.
    pub path: Option<PathMatchConfig>,

    /// Header predicates, all of which must hold.
    pub headers: Vec<HeaderMatchConfig>,
}

/// Path match kind.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum PathMatchType {
    Exact,
    #[default]
    PathPrefix,
}

/// Path predicate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PathMatchConfig {
    #[serde(rename = "type", default)]
    pub match_type: PathMatchType,
    pub value: String,
}

impl PathMatchConfig {
    pub fn exact(value: impl Into<String>) -> Self {
        Self {
            match_type: PathMatchType::Exact,
            value: value.into(),
        }
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Self {
            match_type: PathMatchType::PathPrefix,
            value: value.into(),
        }
    }
}

/// Header match kind. Only exact matching is supported.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum HeaderMatchType {
    #[default]
    Exact,
}

/// Header predicate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HeaderMatchConfig {
    /// Header name (case-insensitive).
    pub name: String,

    /// Header value (case-sensitive).
    pub value: String,

    #[serde(rename = "type", default)]
    pub match_type: HeaderMatchType,
}

impl HeaderMatchConfig {
    pub fn exact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            match_type: HeaderMatchType::Exact,
        }
    }
}

/// Backend reference as written in a rule. The namespace defaults to the route's.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendRefConfig {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl BackendRefConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Resolve against the owning route's namespace.
    pub fn resolve(&self, route_namespace: &str) -> BackendRef {
        BackendRef::new(
            self.name.clone(),
            self.namespace.clone().unwrap_or_else(|| route_namespace.to_string()),
        )
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BackendConfig {
    /// Backend name.
    pub name: String,

    /// Backend namespace.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl BackendConfig {
    pub fn backend_ref(&self) -> BackendRef {
        BackendRef::new(self.name.clone(), self.namespace.clone())
    }
}

/// Ordering applied between candidate rules that all match a request.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PrecedencePolicy {
    /// Rules with header matches outrank rules without, then longer paths win.
    #[default]
    HeadersFirst,
    /// Longer paths win first, then rules with more header matches.
    PathFirst,
}

/// Route matcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub precedence: PrecedencePolicy,

    /// Backend used when no rule matches. None = explicit 404.
    pub default_backend: Option<BackendRef>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token). None disables auth.
    pub api_key: Option<String>,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
