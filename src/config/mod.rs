//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, predicate compilation)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a GatewayState snapshot
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new snapshot compiled and swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Unknown match types fail deserialization, so they never reach the router

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, BackendRefConfig, GatewayConfig, HeaderMatchConfig, ListenerConfig, LogFormat,
    MatchConfig, MatchingConfig, ObservabilityConfig, PathMatchConfig, PrecedencePolicy, RouteConfig,
    RuleConfig, TimeoutConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
