//! Stellar node binary.

use std::path::PathBuf;

use clap::Parser;
use stellar_node::config::NodeConfig;
use stellar_node::{init_tracing, run_server};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Stellar catalog and constellation workflow server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "stellar.toml")]
    config: PathBuf,

    /// Override the configured port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = NodeConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
        config.validate()?;
    }

    init_tracing(&config.logging.filter)?;
    info!(config = %args.config.display(), "stellar node starting");

    run_server(config).await
}
