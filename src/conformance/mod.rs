//! Conformance harness.
//!
//! # Data Flow
//! ```text
//! ConformanceTest (suite.rs: routes + expected responses)
//!     → gateway_config() installs the routes on a gateway
//!     → readiness.rs polls /admin/routes until every route is programmed
//!     → runner.rs spawns one task per case
//!         → client.rs sends host/path/headers, requires N consistent answers
//!             → echo.rs backend reports which backend answered
//!     → ConformanceReport
//! ```

pub mod client;
pub mod echo;
pub mod expectations;
pub mod readiness;
pub mod runner;
pub mod suite;

pub use client::{make_request_and_expect_response, ConformanceError, Mismatch};
pub use echo::{echo_router, EchoResponse};
pub use expectations::{test_name, ExpectedRequest, ExpectedResponse, Timing};
pub use readiness::{routes_must_be_ready, AdminEndpoint};
pub use runner::{run_conformance_test, CaseReport, ConformanceReport};
pub use suite::{httproute_matching_across_routes, ConformanceTest, INFRA_NAMESPACE};
