//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → routing::RouteTable (select backend from the current snapshot)
//!     → forward.rs (rewrite URI, call backend)
//!     → response.rs (strip hop-by-hop headers, map errors)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::UpstreamError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
