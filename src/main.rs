//! Application entry point for the `sensorflow-aggregates` service.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the measurement schema if it does not exist
//! - Mounting the API routes via the `routes` gateway
//! - Serving until Ctrl-C or SIGTERM, then closing the pool
//!
//! # Environment Variables
//! - `LOCAL_DB_NAME`, `LOCAL_DB_USERNAME`, `LOCAL_DB_PWD` (**required**)
//! - `LOCAL_DB_HOST`, `LOCAL_DB_PORT`, `DB_POOL_MAX`, `LISTEN_ADDR` (optional)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{env, sync::Arc};

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod config;
mod error;
mod interval;
mod models;
mod routes;
mod schema;
mod storage;
mod window;

use storage::{MeasurementStore, PgStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.db_target());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect_with(cfg.connect_options())
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                cfg.db_target(),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");

    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    let app: Router = routes::router(store.clone());

    tracing::info!("Listening on {}", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Database pool closed, exiting");

    Ok(())
}

// ---

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    // ---
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}

/// Install the global `tracing` subscriber; call once at startup.
///
/// `RUST_LOG` wins when set. Otherwise `AXUM_LOG_LEVEL` picks the base level
/// and the sqlx and request-trace targets are kept quieter.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1" | "true" | "yes") => true,
        Ok("0" | "false" | "no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var("AXUM_LOG_LEVEL")
            .ok()
            .filter(|l| matches!(l.as_str(), "trace" | "debug" | "info" | "warn" | "error"))
            .unwrap_or_else(|| "debug".to_string());
        EnvFilter::new(format!("{level},sqlx::query=warn,tower_http=info"))
    });

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
