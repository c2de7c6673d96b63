//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate + compile → Init logging/metrics → Bind listeners → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → servers stop accepting and drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload the config file
//! ```
//!
//! # Design Decisions
//! - Fail fast: a configuration that does not load is fatal at startup
//! - Listeners bind last, after the first snapshot compiled

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
