//! aqf-api - Air quality HTTP service entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use aqf_api::bootstrap::init_models;
use aqf_api::providers::ProviderFetcher;
use aqf_api::{build_router, AppState};
use aqf_common::config::{
    config_file_path, load_toml_config, read_toml_config, CliOverrides, ServiceConfig,
    DEFAULT_LOG_LEVEL,
};
use aqf_common::db;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for aqf-api
#[derive(Parser, Debug)]
#[command(name = "aqf-api")]
#[command(about = "Air pollution forecasting API server")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "AQF_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AQF_PORT")]
    port: Option<u16>,

    /// SQLite database holding the synthetic training rows
    #[arg(long, env = "AQF_DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Model artifact path
    #[arg(long, env = "AQF_MODEL_PATH")]
    model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = config_file_path();

    // Log level has to be known before the subscriber exists
    let log_level = config_path
        .as_deref()
        .filter(|p| p.exists())
        .and_then(|p| read_toml_config(p).ok())
        .and_then(|t| t.logging.level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting aqf-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml = load_toml_config(config_path.as_deref());
    let config = ServiceConfig::resolve(
        CliOverrides {
            host: args.host,
            port: args.port,
            database_path: args.database,
            model_path: args.model,
        },
        toml,
    );

    let pool = db::init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    let fetcher = ProviderFetcher::new(&config.providers, config.provider_timeout)
        .context("Failed to build provider HTTP client")?;

    let addr = config.bind_addr();
    let state = AppState::new(config, fetcher, pool);
    init_models(&state).await;

    let app = build_router(state);

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
