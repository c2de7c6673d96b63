//! Match predicates.
//!
//! # Responsibilities
//! - Match host (exact or wildcard, case-insensitive)
//! - Match path (exact or segment-aware prefix, case-sensitive)
//! - Match headers (exact value, case-insensitive name, AND semantics)
//! - Reject malformed predicates when they are compiled
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Each predicate reports a rank so the router can order candidates

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{HeaderMatchConfig, MatchConfig, PathMatchConfig, PathMatchType};
use crate::routing::request::RouteRequest;

/// A predicate that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("header '{name}' is required to equal both '{first}' and '{second}'")]
    ConflictingHeader {
        name: String,
        first: String,
        second: String,
    },
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &RouteRequest) -> bool;
}

/// Lowercase a host, drop any port and a trailing dot.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// How well a request host matched a route's hostnames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostRank {
    /// The route has no hostnames and accepts any host.
    Any,
    /// Matched `*.suffix`; carries the suffix length.
    Wildcard(usize),
    Exact,
}

/// Matches the request host by rank; see [`HostMatch::rank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMatch {
    Exact(String),
    /// Stored with the leading dot, e.g. `.example.com`.
    Wildcard(String),
}

impl HostMatch {
    /// Parse a route hostname.
    pub fn parse(hostname: &str) -> Result<Self, PredicateError> {
        validate_hostname(hostname)?;
        match hostname.strip_prefix('*') {
            Some(suffix) => Ok(HostMatch::Wildcard(suffix.to_string())),
            None => Ok(HostMatch::Exact(hostname.to_string())),
        }
    }

    /// Rank against an already-normalized host, or None if it does not match.
    pub fn rank(&self, host: &str) -> Option<HostRank> {
        match self {
            HostMatch::Exact(expected) => (host == expected).then_some(HostRank::Exact),
            HostMatch::Wildcard(suffix) => (host.len() > suffix.len() && host.ends_with(suffix.as_str()))
                .then_some(HostRank::Wildcard(suffix.len())),
        }
    }
}

/// Length of the matched path, exact matches winning ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathRank {
    pub len: usize,
    pub exact: bool,
}

/// Matches the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    Exact(String),
    /// Stored without a trailing slash, except for the root.
    Prefix(String),
}

impl Default for PathMatch {
    fn default() -> Self {
        PathMatch::Prefix("/".to_string())
    }
}

impl PathMatch {
    /// Compile a path predicate.
    pub fn parse(config: &PathMatchConfig) -> Result<Self, PredicateError> {
        validate_path(&config.value)?;
        match config.match_type {
            PathMatchType::Exact => Ok(PathMatch::Exact(config.value.clone())),
            PathMatchType::PathPrefix => {
                let trimmed = config.value.trim_end_matches('/');
                let prefix = if trimmed.is_empty() { "/" } else { trimmed };
                Ok(PathMatch::Prefix(prefix.to_string()))
            }
        }
    }

    pub fn matches_path(&self, path: &str) -> bool {
        match self {
            PathMatch::Exact(expected) => path == expected,
            PathMatch::Prefix(prefix) => {
                prefix == "/"
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            }
        }
    }

    pub fn rank(&self) -> PathRank {
        match self {
            PathMatch::Exact(p) => PathRank { len: p.len(), exact: true },
            PathMatch::Prefix(p) => PathRank { len: p.len(), exact: false },
        }
    }
}

impl Matcher for PathMatch {
    fn matches(&self, req: &RouteRequest) -> bool {
        self.matches_path(req.path())
    }
}

/// Matches one header by exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    name: HeaderName,
    value: String,
}

impl HeaderMatch {
    pub fn parse(config: &HeaderMatchConfig) -> Result<Self, PredicateError> {
        validate_header_name(&config.name)?;
        let name = HeaderName::from_bytes(config.name.as_bytes())
            .map_err(|e| PredicateError::InvalidHeaderName(format!("'{}': {}", config.name, e)))?;
        Ok(Self {
            name,
            value: config.value.clone(),
        })
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Matcher for HeaderMatch {
    fn matches(&self, req: &RouteRequest) -> bool {
        req.headers()
            .get_all(&self.name)
            .iter()
            .any(|v| v.as_bytes() == self.value.as_bytes())
    }
}

/// Combines a path predicate and header predicates with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMatch {
    path: PathMatch,
    headers: Vec<HeaderMatch>,
}

impl RequestMatch {
    /// Compile a match. Duplicate identical header predicates collapse; duplicates
    /// with different values are contradictory and rejected.
    pub fn compile(config: &MatchConfig) -> Result<Self, PredicateError> {
        let path = match &config.path {
            Some(p) => PathMatch::parse(p)?,
            None => PathMatch::default(),
        };

        let mut headers: Vec<HeaderMatch> = Vec::with_capacity(config.headers.len());
        for header in &config.headers {
            let header = HeaderMatch::parse(header)?;
            match headers.iter().find(|h| h.name == header.name) {
                Some(existing) if existing.value == header.value => {}
                Some(existing) => {
                    return Err(PredicateError::ConflictingHeader {
                        name: header.name.to_string(),
                        first: existing.value.clone(),
                        second: header.value,
                    });
                }
                None => headers.push(header),
            }
        }

        Ok(Self { path, headers })
    }

    pub fn path(&self) -> &PathMatch {
        &self.path
    }

    pub fn headers(&self) -> &[HeaderMatch] {
        &self.headers
    }
}

impl Matcher for RequestMatch {
    fn matches(&self, req: &RouteRequest) -> bool {
        self.path.matches(req) && self.headers.iter().all(|h| h.matches(req))
    }
}

/// Validate a path value.
///
/// Rules:
/// - Must not be empty
/// - Must start with "/"
/// - Must not have double slashes
pub fn validate_path(path: &str) -> Result<(), PredicateError> {
    if path.is_empty() {
        return Err(PredicateError::InvalidPath("path cannot be empty".to_string()));
    }
    if !path.starts_with('/') {
        return Err(PredicateError::InvalidPath(format!("'{}' must start with '/'", path)));
    }
    if path.contains("//") {
        return Err(PredicateError::InvalidPath(format!("'{}' cannot contain '//'", path)));
    }
    Ok(())
}

/// Validate a hostname according to DNS-1123, allowing a leading "*." label.
pub fn validate_hostname(hostname: &str) -> Result<(), PredicateError> {
    let invalid = |reason: String| Err(PredicateError::InvalidHostname(reason));

    if hostname.is_empty() {
        return invalid("hostname cannot be empty".to_string());
    }
    if hostname.len() > 253 {
        return invalid(format!("'{}' exceeds 253 characters", hostname));
    }

    let to_check = hostname.strip_prefix("*.").unwrap_or(hostname);
    if to_check.is_empty() {
        return invalid("hostname cannot be just '*.'".to_string());
    }
    if to_check.contains("..") {
        return invalid(format!("'{}' cannot contain '..'", hostname));
    }

    for label in to_check.split('.') {
        if label.is_empty() {
            return invalid(format!("'{}' has an empty label", hostname));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return invalid(format!("label '{}' cannot start or end with '-'", label));
        }
        if let Some(c) = label
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return invalid(format!("'{}' contains invalid character '{}'", hostname, c));
        }
    }

    Ok(())
}

/// Validate an HTTP header name (RFC 7230 token, no pseudo-headers).
pub fn validate_header_name(name: &str) -> Result<(), PredicateError> {
    if name.is_empty() {
        return Err(PredicateError::InvalidHeaderName("header name cannot be empty".to_string()));
    }
    if name.len() > 256 {
        return Err(PredicateError::InvalidHeaderName(format!("'{}' exceeds 256 characters", name)));
    }
    if name.contains(':') {
        return Err(PredicateError::InvalidHeaderName(format!("'{}' cannot contain ':'", name)));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(PredicateError::InvalidHeaderName(format!(
            "'{}' contains whitespace or control characters",
            name
        )));
    }
    Ok(())
}
