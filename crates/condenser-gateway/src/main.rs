//! Condenser Gateway - Main entry point
//!
//! Starts the HTTP server that summarizes documents.

use anyhow::Context;
use clap::Parser;
use condenser_gateway::{config::GatewayConfig, start_server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Condenser Gateway - iterative document summarization over HTTP.
#[derive(Debug, Parser)]
#[command(name = "condenser-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CONDENSER_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "condenser_pipeline=trace")
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing (log to stderr)
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            tracing::warn!("No config file specified, using default local configuration");
            tracing::warn!("Usage: condenser-gateway --config <path-to-config.toml>");
            GatewayConfig::default_local_config()
        }
    };

    start_server(config).await?;

    Ok(())
}
