//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → request.rs (normalized RouteRequest)
//!     → router.rs (scan compiled matches, rank candidates)
//!     → matcher.rs (evaluate host/path/header predicates)
//!     → Return: MatchResult (Matched, Fallback or Unmatched)
//!
//! Route Compilation (at load and on every reload):
//!     RouteConfig[]
//!     → Sort by declaration order (priority, namespace, name)
//!     → Compile predicates, rejecting malformed ones
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled ahead of time, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same rule
//! - Most specific rule wins; declaration order is a total tie-break

pub mod matcher;
pub mod request;
pub mod router;

pub use matcher::{HostMatch, Matcher, PathMatch, PredicateError, RequestMatch};
pub use request::{RequestError, RouteRequest};
pub use router::{CompileError, MatchResult, ProgrammedRoute, RouteKey, RouteMatch, RouteTable};
