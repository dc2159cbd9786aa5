//! Configuration loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Filename offered for every generated deck unless overridden
pub const DEFAULT_DECK_FILENAME: &str = "sales-deck.pdf";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string
    pub database_url: String,
    pub db_max_connections: u32,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Download filename for generated decks
    pub deck_filename: String,
    /// Lifetime of the cached resolved catalog
    pub catalog_ttl: Duration,
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            bind_addr: parse_var("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            deck_filename: env::var("DECK_FILENAME").unwrap_or_else(|_| DEFAULT_DECK_FILENAME.to_string()),
            catalog_ttl: Duration::from_secs(parse_var("CATALOG_TTL_SECS", 300)?),
        })
    }

    /// Configuration for tests and tools that never open the database
    pub fn local(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            db_max_connections: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "warn".to_string(),
            deck_filename: DEFAULT_DECK_FILENAME.to_string(),
            catalog_ttl: Duration::from_secs(300),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
