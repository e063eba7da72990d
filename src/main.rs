use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing::info;

mod analytics;
mod blob;
mod cleanup;
mod config;
mod events;
mod logging;
mod store;
#[cfg(test)]
mod test_utils;

use crate::analytics::AnalyticsEngine;
use crate::blob::S3BlobStore;
use crate::cleanup::RetentionSweeper;
use crate::events::BroadcastChannel;
use crate::store::SqliteRecordStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the analytics engine and the retention sweeper
    Run,
    /// Execute a single retention sweep and exit
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", cli.config, e);
            process::exit(1);
        }
    };

    let _log_guard = logging::init_logging(config.logging.as_ref(), cli.verbose)?;

    info!("railtrace v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config);

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Sweep => sweep(config).await,
    }
}

/// Run both core services until interrupted
async fn run(config: config::Config) -> Result<()> {
    let (store, blobs) = init_backends(&config).await?;
    let channel = Arc::new(BroadcastChannel::new(config.events.capacity));

    let engine = AnalyticsEngine::start(Arc::clone(&store), Arc::clone(&channel));

    let sweeper = RetentionSweeper::new(store, blobs, config.retention.clone());
    sweeper.start();

    info!("Services running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    engine.stop().await;
    sweeper.stop().await;

    Ok(())
}

/// Execute one retention sweep outside the schedule
async fn sweep(config: config::Config) -> Result<()> {
    let (store, blobs) = init_backends(&config).await?;

    let sweeper = RetentionSweeper::new(store, blobs, config.retention.clone());
    sweeper.run_once().await;

    Ok(())
}

async fn init_backends(
    config: &config::Config,
) -> Result<(Arc<SqliteRecordStore>, Arc<S3BlobStore>)> {
    let store = SqliteRecordStore::new(&config.store.db_path)
        .context("Failed to initialize record store")?;

    let blobs = S3BlobStore::new(&config.blobs)
        .await
        .context("Failed to initialize blob store")?;

    info!("Backends initialized successfully");

    Ok((Arc::new(store), Arc::new(blobs)))
}
