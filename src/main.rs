//! Gateway router.
//!
//! Matches each request against the programmed HTTP routes (host, path and
//! header predicates) and forwards it to the winning rule's backend.
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing::RouteTable ──▶ http::forward ──▶ Backend
//!                     ▲                    ▲
//!                     │             state::SharedState ◀── config (file, watcher, SIGHUP)
//!               admin API (status, routes, backends)
//! ```

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-router")]
#[command(about = "HTTP gateway with host, path and header route matching", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    gateway_router::lifecycle::run(&cli.config).await?;
    Ok(())
}
