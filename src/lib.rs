//! HTTP gateway built around a deterministic route matcher.
//!
//! Requests are matched on host, path and headers against independently
//! declared routes; the most specific rule wins and its backend serves the request.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod state;
pub mod upstream;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

// Test harness
pub mod conformance;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{MatchResult, RouteRequest, RouteTable};
