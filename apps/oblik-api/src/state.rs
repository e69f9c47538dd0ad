//! Shared application state.
//!
//! The store handle is opened once at startup and handed to every handler.
//! When it cannot be opened the server still runs; data endpoints answer
//! 503 with the reason captured here.

use std::sync::Arc;

use tracing::{error, info, warn};

use oblik_db::{Database, DbConfig, Inventory};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// State shared by all handlers.
pub type SharedState = Arc<AppState>;

#[derive(Debug)]
pub struct AppState {
    store: Store,
}

#[derive(Debug)]
enum Store {
    Ready(Inventory),
    Unavailable(String),
}

impl AppState {
    pub fn ready(inventory: Inventory) -> Self {
        AppState {
            store: Store::Ready(inventory),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        AppState {
            store: Store::Unavailable(reason.into()),
        }
    }

    /// Opens the store described by the configuration.
    ///
    /// Never fails: a missing URL or a connection error yields an
    /// unavailable state, logged once here.
    pub async fn connect(config: &ApiConfig) -> Self {
        let Some(url) = config.database_url.as_deref() else {
            warn!("OBLIK_DATABASE_URL is not set, data endpoints will answer 503");
            return AppState::unavailable("client not initialized");
        };

        let db_config = DbConfig::new(url).max_connections(config.max_connections);

        match Database::new(db_config).await {
            Ok(db) => {
                info!("Connected to SQLite");
                AppState::ready(Inventory::new(db, config.cache_ttl))
            }
            Err(e) => {
                error!(error = %e, "Failed to open database, data endpoints will answer 503");
                AppState::unavailable("connection failed")
            }
        }
    }

    /// The inventory service, or the 503 every data endpoint returns
    /// without one.
    pub fn inventory(&self) -> ApiResult<&Inventory> {
        match &self.store {
            Store::Ready(inventory) => Ok(inventory),
            Store::Unavailable(reason) => Err(ApiError::unavailable(reason)),
        }
    }

    /// Releases the store handle.
    pub async fn close(&self) {
        if let Store::Ready(inventory) = &self.store {
            inventory.close().await;
            info!("Database closed");
        }
    }
}
