//! OS signal handling.
//!
//! SIGINT/SIGTERM trigger graceful shutdown. SIGHUP reloads the config file;
//! a reload that fails to load is logged and the current routes stay.

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::config::{load_config, GatewayConfig};
use crate::lifecycle::Shutdown;

/// Wait for SIGINT or SIGTERM, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received"),
        _ = terminate => tracing::info!("SIGTERM received"),
    }

    shutdown.trigger();
}

/// Reload `path` on every SIGHUP and push the result to `updates`.
#[cfg(unix)]
pub async fn reload_on_sighup(path: PathBuf, updates: mpsc::UnboundedSender<GatewayConfig>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP");
            return;
        }
    };

    while sighup.recv().await.is_some() {
        tracing::info!(path = ?path, "SIGHUP received, reloading configuration");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    return;
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to reload config, keeping current configuration"),
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_sighup(_path: PathBuf, _updates: mpsc::UnboundedSender<GatewayConfig>) {}
