//! Cachet Node: entry point.
//!
//! Starts the Cachet credential node with configuration from a TOML file or defaults.

mod api;
mod config;
mod node;
mod state;
mod storage;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::CachetConfig;
use node::CachetNode;

/// Cachet Node
#[derive(Parser, Debug)]
#[command(name = "cachet-node", version, about = "Cachet credential node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "cachet.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long)]
    log_format: Option<String>,

    /// Override the credential history capacity.
    #[arg(long)]
    history_capacity: Option<usize>,

    /// Only resolve `did:web` documents published by this node.
    #[arg(long)]
    offline: bool,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(config: &CachetConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let config = CachetConfig::default();
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = CachetConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
    if let Some(capacity) = args.history_capacity {
        config.engine.history_capacity = capacity;
    }
    if args.offline {
        config.resolver.remote_fetch = false;
    }
    config.validate()?;

    init_tracing(&config);
    tracing::info!("Cachet Node v{}", env!("CARGO_PKG_VERSION"));

    let node = CachetNode::new(config)?;

    // Set up graceful shutdown on SIGINT
    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "API server error");
                return Err(e);
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("received shutdown signal");
        }
    }

    tracing::info!("Cachet node exited cleanly");
    Ok(())
}
