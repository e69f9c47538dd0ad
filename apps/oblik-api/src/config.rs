//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | variable                | default     | meaning                          |
//! |-------------------------|-------------|----------------------------------|
//! | `OBLIK_DATABASE_URL`    | (none)      | SQLite URL or file path          |
//! | `OBLIK_BIND_ADDR`       | `0.0.0.0`   | listen address                   |
//! | `OBLIK_PORT`            | `8000`      | listen port                      |
//! | `OBLIK_CACHE_TTL_SECS`  | `60`        | read cache lifetime, 0 disables  |
//! | `OBLIK_MAX_CONNECTIONS` | `5`         | SQLite pool size                 |
//!
//! A missing database URL is not an error here: the server still starts and
//! every data endpoint answers "service unavailable".

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// API server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// SQLite connection string; `None` leaves the store unavailable.
    pub database_url: Option<String>,

    pub bind_addr: IpAddr,
    pub port: u16,

    /// Lifetime of cached reads.
    pub cache_ttl: Duration,

    pub max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            database_url: None,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            cache_ttl: Duration::from_secs(60),
            max_connections: 5,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment, or a
    /// map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        Ok(ApiConfig {
            database_url: lookup("OBLIK_DATABASE_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),

            bind_addr: parse_or(&lookup, "OBLIK_BIND_ADDR", defaults.bind_addr)?,

            port: parse_or(&lookup, "OBLIK_PORT", defaults.port)?,

            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "OBLIK_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),

            max_connections: match parse_or(&lookup, "OBLIK_MAX_CONNECTIONS", defaults.max_connections)? {
                0 => return Err(ConfigError::InvalidValue("OBLIK_MAX_CONNECTIONS".to_string())),
                n => n,
            },
        })
    }

    /// Socket address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
