//! # Letterbox - contact form service
//!
//! Accepts contact-form submissions, encrypts them, and keeps them in blob
//! storage. Admins list, read, and mark messages as seen.
//!
//! ## Architecture
//! ```text
//! Browser ──► POST /api/contact ──► rate limit ─► validate ─► CAPTCHA ─► encrypt ──► Blob store
//! Admin   ──► GET  /api/admin/contacts ─────────────────────────────── decrypt ◄─── Blob store
//!         ──► POST /api/admin/seen ──────────────────────────────── seen/ marker ─► Blob store
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod auth;
mod captcha;
mod config;
mod error;
mod ratelimit;
mod routes;
mod state;
mod storage;

use config::{AppConfig, StorageBackend};
use ratelimit::sweeper_worker;
use state::AppState;

/// Letterbox - contact form backend
#[derive(Parser, Debug)]
#[command(name = "letterbox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/letterbox.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Comma-separated origin allow-list (overrides config)
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Shared admin key
    #[arg(long, env = "ADMIN_KEY", hide_env_values = true)]
    admin_key: Option<String>,

    /// Base64 32-byte data encryption key
    #[arg(long, env = "DATA_ENC_KEY", hide_env_values = true)]
    data_enc_key: Option<String>,

    /// Turnstile secret; enables CAPTCHA enforcement
    #[arg(long, env = "TURNSTILE_SECRET_KEY", hide_env_values = true)]
    turnstile_secret: Option<String>,

    /// Storage backend (overrides config)
    #[arg(long, value_enum, env = "STORAGE_BACKEND")]
    storage: Option<StorageBackend>,

    /// Blob service base URL
    #[arg(long, env = "BLOB_API_URL")]
    blob_url: Option<String>,

    /// Blob service read/write token
    #[arg(long, env = "BLOB_READ_WRITE_TOKEN", hide_env_values = true)]
    blob_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before clap reads the environment
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("📮 Starting Letterbox v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(
        storage = ?config.storage.backend,
        origins = config.allowed_origins.len(),
        "📋 Configuration loaded"
    );

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    // Initialize application state
    let state = AppState::new(config.clone())?;

    // Spawn rate-limit sweeper
    let sweeper_shutdown = shutdown_tx.subscribe();
    tokio::spawn(sweeper_worker(
        state.rate_limiter.clone(),
        Duration::from_secs(config.rate_limit.sweep_interval_secs),
        sweeper_shutdown,
    ));

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("🚀 Letterbox listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        shutdown_signal().await;
        info!("🛑 Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
    .context("Server error")?;

    info!("👋 Letterbox shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}
