use clap::Parser;
use gateway_router::config::ObservabilityConfig;
use gateway_router::conformance::echo;
use gateway_router::observability::logging::init_logging;
use gateway_router::upstream::BackendRef;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "echo-backend")]
#[command(about = "Backend that echoes the request it received and its own identity", long_about = None)]
struct Cli {
    /// Backend name reported in every response
    #[arg(short, long)]
    name: String,

    #[arg(short = 's', long, default_value = "gateway-conformance-infra")]
    namespace: String,

    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&ObservabilityConfig::default())?;

    let listener = TcpListener::bind(&cli.listen).await?;
    echo::serve(listener, BackendRef::new(cli.name, cli.namespace)).await?;
    Ok(())
}
