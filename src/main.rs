//! Model Pool - Main entry point

use anyhow::Result;
use clap::Parser;
use model_pool::{ModelPool, PoolConfig};
use std::path::PathBuf;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "model-pool")]
#[command(about = "Capacity-aware model pool manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the provider endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    match cli.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .init();
        }
    }

    tracing::info!("Starting model pool");

    // Load configuration
    let mut config = PoolConfig::load(cli.config)?;

    // CLI overrides
    if let Some(endpoint) = cli.endpoint {
        config.provider_endpoint = endpoint;
    }

    config.validate()?;

    tracing::info!(
        endpoint = %config.provider_endpoint,
        max_concurrent = config.policy.max_concurrent_models,
        unload_threshold_mb = config.policy.unload_threshold_mb,
        "Configuration loaded"
    );

    let pool = ModelPool::new(config).await;

    // Provider refresh is best-effort; defaults stay in place on failure
    pool.discover_models().await;
    pool.preload().await;

    let status = pool.status().await;
    tracing::info!(
        total_models = status.total_models,
        loaded_models = status.loaded_models,
        assignments = status.assignments,
        "Model pool ready"
    );

    shutdown_signal().await;

    tracing::info!("Shutting down...");
    pool.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
