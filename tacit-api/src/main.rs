//! tacit-api - Sentence service for the TACIT annotation tool
//!
//! Loads the configured CSV datasets once, then serves stratified random
//! sentences to the browser front-end. Any dataset problem stops startup
//! before the listener is bound.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tacit_common::config::{
    ConfigFileResolver, ConfigOverrides, SamplingMode, ServiceConfig, TomlConfig,
};
use tacit_api::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for tacit-api
#[derive(Parser, Debug)]
#[command(name = "tacit-api")]
#[command(about = "Serves CCT-labeled sentences to the TACIT annotation front-end")]
#[command(version)]
struct Args {
    /// TOML config file (falls back to TACIT_CONFIG, then the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TACIT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TACIT_PORT")]
    port: Option<u16>,

    /// Seed for reproducible sampling
    #[arg(long, env = "TACIT_SEED")]
    seed: Option<u64>,

    /// Sampling mode
    #[arg(long, env = "TACIT_SAMPLING", value_parser = ["stratified", "uniform"])]
    sampling: Option<String>,

    /// Labeled CSV file (repeatable; replaces labeled files from the config)
    #[arg(short, long = "data", env = "TACIT_DATA", value_delimiter = ',')]
    data: Vec<PathBuf>,

    /// CSV file of sentences with no applicable label
    #[arg(long, env = "TACIT_UNLABELED")]
    unlabeled: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TACIT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            seed: self.seed,
            sampling: self.sampling.as_deref().map(|mode| match mode {
                "uniform" => SamplingMode::Uniform,
                _ => SamplingMode::Stratified,
            }),
            labeled: self.data.clone(),
            unlabeled: self.unlabeled.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is resolved before tracing so the configured level applies
    let config_path = ConfigFileResolver::new(args.config.clone()).resolve()?;
    let toml = match &config_path {
        Some(path) => Some(TomlConfig::load(path)?),
        None => None,
    };
    let config = ServiceConfig::resolve(toml, args.overrides())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tacit_api={0},tacit_common={0},tower_http={0}",
                    config.logging.level
                )
                .into()
            }),
        )
        .init();

    info!(
        "Starting TACIT sentence service (tacit-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config file found, using compiled defaults"),
    }
    if let Some(seed) = config.seed {
        info!("Sampling with fixed seed {}", seed);
    }

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to load dataset: {}", e);
            return Err(e.into());
        }
    };
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("tacit-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

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
            info!("Received SIGTERM, shutting down");
        },
    }
}
