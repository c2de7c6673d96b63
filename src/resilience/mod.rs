//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Upstream dispatch:
//!     → timeouts.rs (every backend call has a deadline; expiry maps to 504)
//!
//! Conformance polling:
//!     → backoff.rs (jittered exponential delay between readiness and consistency polls)
//! ```

pub mod backoff;
pub mod timeouts;

pub use backoff::Backoff;
pub use timeouts::{with_timeout, TimedOut};
