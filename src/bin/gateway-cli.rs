use clap::{Parser, Subcommand};
use gateway_router::config::load_config;
use gateway_router::conformance::{self, AdminEndpoint, Timing};
use gateway_router::routing::{RouteRequest, RouteTable};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the gateway router", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    /// Admin API key, if the gateway requires one
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List programmed routes
    Routes,
    /// List backends and in-flight requests
    Backends,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Match a request against a configuration file without a running gateway
    Match {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        host: String,
        #[arg(long, default_value = "/")]
        path: String,
        /// Request header as `name=value`; repeatable
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
    /// Run conformance tests against a running gateway
    Conformance {
        /// Gateway traffic address
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        gateway: SocketAddr,
        /// Run only this test
        #[arg(short, long)]
        test: Option<String>,
        /// List the built-in tests and exit
        #[arg(long)]
        list: bool,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => admin_get(&cli.url, cli.key.as_deref(), "/admin/status").await?,
        Commands::Routes => admin_get(&cli.url, cli.key.as_deref(), "/admin/routes").await?,
        Commands::Backends => admin_get(&cli.url, cli.key.as_deref(), "/admin/backends").await?,
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            RouteTable::compile(&config.routes, &config.matching)?;
            println!(
                "OK: {} routes, {} backends",
                config.routes.len(),
                config.backends.len()
            );
        }
        Commands::Match {
            config,
            host,
            path,
            headers,
        } => {
            let config = load_config(&config)?;
            let table = RouteTable::compile(&config.routes, &config.matching)?;
            let mut request = RouteRequest::new(&host, path);
            for (name, value) in &headers {
                request = request.with_header(name, value)?;
            }
            let result = table.match_request(&request);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Conformance { gateway, test, list } => {
            let tests = match test {
                Some(name) => vec![conformance::suite::find_test(&name)
                    .ok_or(conformance::ConformanceError::UnknownTest(name))?],
                None => conformance::suite::all_tests(),
            };
            if list {
                for t in &tests {
                    println!("{}: {} ({} cases)", t.short_name, t.description, t.cases.len());
                }
                return Ok(());
            }

            let admin = AdminEndpoint::new(cli.url, cli.key);
            let timing = Timing::default();
            let mut failed = false;
            for t in &tests {
                let report = conformance::run_conformance_test(t, gateway, &admin, &timing).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                failed |= !report.passed();
            }
            if failed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn admin_get(url: &str, key: Option<&str>, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if let Some(key) = key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let res = reqwest::Client::new()
        .get(format!("{}{}", url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
