//! Gateway snapshot.
//!
//! # Responsibilities
//! - Compile a validated configuration into routes + backends
//! - Publish it as one immutable snapshot
//! - Swap snapshots atomically on reload
//!
//! # Design Decisions
//! - A request loads the snapshot once and uses it for matching and dispatch,
//!   so it sees either the old or the new route set in full
//! - A reload that fails to validate or compile leaves the current snapshot in place
//!   and does not consume a generation
//! - Reloads are serialized, so stored generations only increase
//! - Listener limits and the connect timeout are fixed at startup; a reload that
//!   changes them is applied for routing only and logged

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, GatewayConfig};
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::upstream::BackendRegistry;

/// Everything one request needs, frozen at a point in time.
#[derive(Debug)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub routes: RouteTable,
    pub backends: BackendRegistry,
}

impl GatewayState {
    /// Validate and compile a configuration.
    pub fn build(config: GatewayConfig, generation: u64) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let routes = RouteTable::compile(&config.routes, &config.matching)?.with_generation(generation);
        let backends = BackendRegistry::new(&config.backends);

        Ok(Self {
            config,
            routes,
            backends,
        })
    }
}

/// Settings baked into the listener and HTTP client when the server starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StartupSettings {
    max_body_size: usize,
    max_connections: usize,
    connect_secs: u64,
}

impl StartupSettings {
    fn of(config: &GatewayConfig) -> Self {
        Self {
            max_body_size: config.listener.max_body_size,
            max_connections: config.listener.max_connections,
            connect_secs: config.timeouts.connect_secs,
        }
    }

    /// Names of the settings that differ in `other`.
    fn changed(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.max_body_size != other.max_body_size {
            changed.push("listener.max_body_size");
        }
        if self.max_connections != other.max_connections {
            changed.push("listener.max_connections");
        }
        if self.connect_secs != other.connect_secs {
            changed.push("timeouts.connect_secs");
        }
        changed
    }
}

/// Shared handle to the current snapshot.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<ArcSwap<GatewayState>>,
    /// Generation of the stored snapshot. Held across build and store.
    generation: Arc<Mutex<u64>>,
    startup: StartupSettings,
}

impl SharedState {
    /// Build the initial snapshot (generation 1).
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let startup = StartupSettings::of(&config);
        let state = GatewayState::build(config, 1)?;
        metrics::record_route_table(state.routes.generation(), state.routes.routes().len());

        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(state)),
            generation: Arc::new(Mutex::new(1)),
            startup,
        })
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<GatewayState> {
        self.inner.load_full()
    }

    /// Replace the snapshot with one built from `config`.
    ///
    /// Returns the new generation. A rejected config leaves both the snapshot
    /// and the generation counter untouched.
    pub fn apply(&self, config: GatewayConfig) -> Result<u64, ConfigError> {
        let mut current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = *current + 1;

        let ignored = self.startup.changed(&StartupSettings::of(&config));
        let state = GatewayState::build(config, generation)?;
        let routes = state.routes.routes().len();

        self.inner.store(Arc::new(state));
        *current = generation;
        drop(current);

        metrics::record_route_table(generation, routes);
        if !ignored.is_empty() {
            tracing::warn!(
                generation,
                settings = ?ignored,
                "Reload changes settings fixed at startup; restart to apply them"
            );
        }
        tracing::info!(generation, routes, "Route snapshot swapped");
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, BackendRefConfig, RouteConfig, RuleConfig};
    use crate::routing::{RouteKey, RouteRequest};

    fn config_with_route(name: &str) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.backends.push(BackendConfig {
            name: "v1".into(),
            namespace: "default".into(),
            address: "127.0.0.1:3001".into(),
        });
        config.routes.push(RouteConfig {
            name: name.into(),
            namespace: "default".into(),
            hostnames: vec![],
            priority: 0,
            rules: vec![RuleConfig {
                matches: vec![],
                backend: BackendRefConfig::named("v1"),
            }],
        });
        config
    }

    #[test]
    fn test_apply_swaps_whole_snapshot() {
        let shared = SharedState::new(config_with_route("first")).unwrap();
        let before = shared.load();
        assert_eq!(before.routes.generation(), 1);

        let generation = shared.apply(config_with_route("second")).unwrap();
        assert_eq!(generation, 2);

        // The old snapshot is still intact for whoever holds it.
        assert!(before.routes.contains(&RouteKey::new("default", "first")));

        let after = shared.load();
        assert!(after.routes.contains(&RouteKey::new("default", "second")));
        assert!(!after.routes.contains(&RouteKey::new("default", "first")));
        assert!(!after.routes.match_request(&RouteRequest::new("h", "/")).is_unmatched());
    }

    #[test]
    fn test_failed_apply_keeps_current_snapshot() {
        let shared = SharedState::new(config_with_route("first")).unwrap();

        let mut broken = config_with_route("second");
        broken.routes[0].rules[0].backend = BackendRefConfig::named("missing");
        assert!(matches!(shared.apply(broken), Err(ConfigError::Validation(_))));

        assert!(shared.load().routes.contains(&RouteKey::new("default", "first")));
    }

    #[test]
    fn test_failed_apply_does_not_consume_generation() {
        let shared = SharedState::new(config_with_route("first")).unwrap();

        let mut broken = config_with_route("second");
        broken.routes[0].rules[0].backend = BackendRefConfig::named("missing");
        assert!(shared.apply(broken).is_err());

        assert_eq!(shared.apply(config_with_route("second")).unwrap(), 2);
        assert_eq!(shared.load().routes.generation(), 2);
    }

    #[test]
    fn test_concurrent_applies_store_latest_generation() {
        let shared = SharedState::new(config_with_route("first")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || shared.apply(config_with_route(&format!("r{i}"))).unwrap())
            })
            .collect();
        let mut generations: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        generations.sort_unstable();

        assert_eq!(generations, (2..=9).collect::<Vec<_>>());
        assert_eq!(shared.load().routes.generation(), 9);
    }

    #[test]
    fn test_startup_settings_changes_are_reported() {
        let base = config_with_route("first");
        let startup = StartupSettings::of(&base);
        assert!(startup.changed(&StartupSettings::of(&base)).is_empty());

        let mut changed = base.clone();
        changed.listener.max_body_size += 1;
        changed.listener.max_connections += 1;
        changed.timeouts.connect_secs += 1;
        assert_eq!(
            startup.changed(&StartupSettings::of(&changed)),
            vec!["listener.max_body_size", "listener.max_connections", "timeouts.connect_secs"]
        );
    }

    #[test]
    fn test_apply_with_startup_settings_changed_still_swaps_routes() {
        let shared = SharedState::new(config_with_route("first")).unwrap();

        let mut changed = config_with_route("second");
        changed.listener.max_body_size = 1;
        shared.apply(changed).unwrap();

        assert!(shared.load().routes.contains(&RouteKey::new("default", "second")));
    }
}
