//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the config watcher and signal handlers
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when the first snapshot compiled)

use std::path::Path;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin;
use crate::config::{load_config, ConfigError, ConfigWatcher};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("config watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server: {0}")]
    Serve(#[from] std::io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Run the gateway from a config file until SIGINT/SIGTERM.
pub async fn run(config_path: &Path) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = ?config_path,
        routes = config.routes.len(),
        backends = config.backends.len(),
        precedence = ?config.matching.precedence,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let (watcher, config_updates) = ConfigWatcher::new(config_path);
    tokio::spawn(signals::reload_on_sighup(config_path.to_path_buf(), watcher.sender()));
    let _watcher = watcher.run()?;

    let admin_config = config.admin.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    if admin_config.enabled {
        let listener = bind(&admin_config.bind_address).await?;
        let state = server.state();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, shutdown_rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
