//! Route lookup.
//!
//! # Responsibilities
//! - Compile route configuration into an immutable route table
//! - Select exactly one rule for a request, or report no match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Linear scan over compiled matches (acceptable for typical route counts)
//! - Candidates compared by a derived `Ord` key; declaration order breaks ties
//! - Explicit Unmatched rather than a silent default

use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::schema::{MatchConfig, MatchingConfig, PrecedencePolicy, RouteConfig};
use crate::routing::matcher::{HostMatch, HostRank, Matcher, PathRank, PredicateError, RequestMatch};
use crate::routing::request::RouteRequest;
use crate::upstream::BackendRef;

/// Stable route identifier (`namespace/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
pub struct RouteKey {
    pub namespace: String,
    pub name: String,
}

impl RouteKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Error compiling a route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("route {route}: {source}")]
    InvalidHostname {
        route: RouteKey,
        #[source]
        source: PredicateError,
    },

    #[error("route {route}, rule {rule}, match {index}: {source}")]
    InvalidMatch {
        route: RouteKey,
        rule: usize,
        index: usize,
        #[source]
        source: PredicateError,
    },

    #[error("duplicate route {0}")]
    DuplicateRoute(RouteKey),
}

/// The rule selected for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub backend: BackendRef,
    pub route: RouteKey,
    pub rule_index: usize,
    pub match_index: usize,
}

/// Outcome of matching one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum MatchResult {
    Matched(RouteMatch),
    /// No rule matched and a default backend is configured.
    Fallback { backend: BackendRef },
    Unmatched,
}

impl MatchResult {
    /// The backend to dispatch to, if any.
    pub fn backend(&self) -> Option<&BackendRef> {
        match self {
            MatchResult::Matched(m) => Some(&m.backend),
            MatchResult::Fallback { backend } => Some(backend),
            MatchResult::Unmatched => None,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        matches!(self, MatchResult::Unmatched)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            MatchResult::Matched(_) => "matched",
            MatchResult::Fallback { .. } => "fallback",
            MatchResult::Unmatched => "unmatched",
        }
    }
}

/// A route as programmed into the table (admin view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ProgrammedRoute {
    pub key: RouteKey,
    pub hostnames: Vec<String>,
    pub rules: usize,
}

/// One match of one rule, ready to evaluate.
#[derive(Debug)]
struct CompiledMatch {
    route: RouteKey,
    hosts: Arc<[HostMatch]>,
    request_match: RequestMatch,
    backend: BackendRef,
    rule_index: usize,
    match_index: usize,
}

/// Precedence key; the larger key wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity {
    host: HostRank,
    /// Always false under `PathFirst`.
    has_headers: bool,
    path: PathRank,
    header_count: usize,
}

/// Immutable, compiled set of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Sorted in declaration order: priority desc, namespace, name, rule, match.
    matches: Vec<CompiledMatch>,
    routes: Vec<ProgrammedRoute>,
    policy: PrecedencePolicy,
    default_backend: Option<BackendRef>,
    generation: u64,
}

impl RouteTable {
    /// Compile routes into a table.
    pub fn compile(routes: &[RouteConfig], matching: &MatchingConfig) -> Result<Self, CompileError> {
        let mut ordered: Vec<&RouteConfig> = routes.iter().collect();
        ordered.sort_by(|a, b| {
            (Reverse(a.priority), &a.namespace, &a.name).cmp(&(Reverse(b.priority), &b.namespace, &b.name))
        });

        let mut matches = Vec::new();
        let mut programmed: Vec<ProgrammedRoute> = Vec::with_capacity(ordered.len());

        for route in ordered {
            let key = RouteKey::new(route.namespace.clone(), route.name.clone());
            if programmed.iter().any(|p| p.key == key) {
                return Err(CompileError::DuplicateRoute(key));
            }

            let hosts = route
                .hostnames
                .iter()
                .map(|h| HostMatch::parse(h))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CompileError::InvalidHostname {
                    route: key.clone(),
                    source,
                })?;
            let hosts: Arc<[HostMatch]> = hosts.into();

            for (rule_index, rule) in route.rules.iter().enumerate() {
                let backend = rule.backend.resolve(&route.namespace);
                let implicit = [MatchConfig::default()];
                let configs = if rule.matches.is_empty() {
                    &implicit[..]
                } else {
                    &rule.matches[..]
                };

                for (match_index, config) in configs.iter().enumerate() {
                    let request_match =
                        RequestMatch::compile(config).map_err(|source| CompileError::InvalidMatch {
                            route: key.clone(),
                            rule: rule_index,
                            index: match_index,
                            source,
                        })?;

                    matches.push(CompiledMatch {
                        route: key.clone(),
                        hosts: Arc::clone(&hosts),
                        request_match,
                        backend: backend.clone(),
                        rule_index,
                        match_index,
                    });
                }
            }

            tracing::debug!(
                route = %key,
                hostnames = ?route.hostnames,
                rules = route.rules.len(),
                "Route compiled"
            );

            programmed.push(ProgrammedRoute {
                key,
                hostnames: route.hostnames.clone(),
                rules: route.rules.len(),
            });
        }

        Ok(Self {
            matches,
            routes: programmed,
            policy: matching.precedence,
            default_backend: matching.default_backend.clone(),
            generation: 0,
        })
    }

    /// Stamp the table with a snapshot generation.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Select the rule for a request.
    ///
    /// The most specific candidate wins; among equally specific candidates the
    /// first in declaration order wins.
    pub fn match_request(&self, request: &RouteRequest) -> MatchResult {
        let mut best: Option<(Specificity, &CompiledMatch)> = None;

        for candidate in &self.matches {
            let Some(specificity) = self.specificity(candidate, request) else {
                continue;
            };
            if best.map_or(true, |(current, _)| specificity > current) {
                best = Some((specificity, candidate));
            }
        }

        match best {
            Some((_, m)) => MatchResult::Matched(RouteMatch {
                backend: m.backend.clone(),
                route: m.route.clone(),
                rule_index: m.rule_index,
                match_index: m.match_index,
            }),
            None => match &self.default_backend {
                Some(backend) => MatchResult::Fallback {
                    backend: backend.clone(),
                },
                None => MatchResult::Unmatched,
            },
        }
    }

    /// Rank a candidate against a request, or None if it does not match.
    fn specificity(&self, candidate: &CompiledMatch, request: &RouteRequest) -> Option<Specificity> {
        let host = if candidate.hosts.is_empty() {
            HostRank::Any
        } else {
            candidate.hosts.iter().filter_map(|h| h.rank(request.host())).max()?
        };

        if !candidate.request_match.matches(request) {
            return None;
        }

        let header_count = candidate.request_match.headers().len();
        Some(Specificity {
            host,
            has_headers: self.policy == PrecedencePolicy::HeadersFirst && header_count > 0,
            path: candidate.request_match.path().rank(),
            header_count,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Programmed routes in declaration order.
    pub fn routes(&self) -> &[ProgrammedRoute] {
        &self.routes
    }

    pub fn contains(&self, key: &RouteKey) -> bool {
        self.routes.iter().any(|r| &r.key == key)
    }

    /// Number of compiled matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
