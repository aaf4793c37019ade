//! Configuration loader for the `sensorflow-aggregates` service.
//!
//! All runtime settings are read once from environment variables (the caller
//! loads an optional `.env` first). Keeping the `env::var` calls here means
//! the rest of the service only ever sees a typed [`Config`].
use std::{env, net::SocketAddr};

use anyhow::{anyhow, Result};
use sqlx::postgres::PgConnectOptions;

/// Parse an optional environment variable with a default value.
macro_rules! parse_env_or {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// Immutable after loading; one snapshot serves the whole process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Database name.
    pub db_name: String,

    /// Role used to connect.
    pub db_user: String,

    /// Password for `db_user`. Never logged.
    pub db_password: String,

    /// Database host.
    pub db_host: String,

    /// Database port.
    pub db_port: u16,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `LOCAL_DB_NAME` – database name
/// - `LOCAL_DB_USERNAME` – database role
/// - `LOCAL_DB_PWD` – database password
///
/// Optional:
/// - `LOCAL_DB_HOST` – database host (default: `localhost`)
/// - `LOCAL_DB_PORT` – database port (default: 5432)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `LISTEN_ADDR` – HTTP bind address (default: `0.0.0.0:8080`)
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_name = require_env!("LOCAL_DB_NAME");
    let db_user = require_env!("LOCAL_DB_USERNAME");
    let db_password = require_env!("LOCAL_DB_PWD");
    let db_host = env::var("LOCAL_DB_HOST").unwrap_or_else(|_| "localhost".into());
    let db_port = parse_env_or!("LOCAL_DB_PORT", u16, 5432);
    let db_pool_max = parse_env_or!("DB_POOL_MAX", u32, 5);
    let listen_addr = parse_env_or!(
        "LISTEN_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 8080))
    );

    if db_pool_max == 0 {
        return Err(anyhow!("Invalid DB_POOL_MAX: must be at least 1"));
    }

    Ok(Config {
        db_name,
        db_user,
        db_password,
        db_host,
        db_port,
        db_pool_max,
        listen_addr,
    })
}

impl Config {
    /// Connection options for the PostgreSQL pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }

    /// Human readable connection target, without credentials.
    pub fn db_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.db_user, self.db_host, self.db_port, self.db_name
        )
    }

    /// Log the loaded configuration, masking the password.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  LOCAL_DB_NAME     : {}", self.db_name);
        tracing::info!("  LOCAL_DB_USERNAME : {}", self.db_user);
        tracing::info!("  LOCAL_DB_PWD      : ****");
        tracing::info!("  LOCAL_DB_HOST     : {}", self.db_host);
        tracing::info!("  LOCAL_DB_PORT     : {}", self.db_port);
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!("  LISTEN_ADDR       : {}", self.listen_addr);
    }
}
