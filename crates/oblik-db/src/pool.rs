//! # Store Handle
//!
//! Opening, migrating, health-checking and closing the SQLite store.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OBLIK_DATABASE_URL ──► DbConfig::new(url)                              │
//! │                              │  .max_connections(n)                     │
//! │                              ▼                                          │
//! │                         Database::new ──► apply 001_initial_schema ...  │
//! │                              │                                          │
//! │             ┌────────────────┼────────────────┐                         │
//! │             ▼                ▼                ▼                         │
//! │         items()          sales()        health_check()                  │
//! │      ItemRepository   SaleRepository     SELECT 1                       │
//! │                                                                         │
//! │  shutdown ──► Database::close()   (later queries fail: pool closed)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every connection runs in WAL mode with `foreign_keys` on, so a sale can
//! never point at a missing item.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::item::ItemRepository;
use crate::repository::sale::SaleRepository;

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Longest a pooled file connection is reused before being reopened.
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Configuration
// =============================================================================

/// How to open the store.
///
/// ```rust,ignore
/// let config = DbConfig::new("data/oblik.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `sqlite://path`, `sqlite::memory:` or a plain file path.
    pub database_url: String,

    pub max_connections: u32,
    pub min_connections: u32,

    /// How long a caller waits for a free connection.
    pub connect_timeout: Duration,

    /// `None` keeps idle connections forever.
    pub idle_timeout: Option<Duration>,

    /// Apply pending schema migrations while opening.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store with pool defaults: 1..=5 connections, 30 s
    /// acquire timeout, 10 min idle timeout, migrations on.
    pub fn new(url: impl Into<String>) -> Self {
        DbConfig {
            database_url: url.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        DbConfig {
            max_connections,
            ..self
        }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        DbConfig {
            min_connections,
            ..self
        }
    }

    pub fn run_migrations(self, run_migrations: bool) -> Self {
        DbConfig {
            run_migrations,
            ..self
        }
    }

    /// Private in-memory store, as used by tests.
    ///
    /// Exactly one connection, never recycled: the data lives only as long
    /// as that connection does.
    pub fn in_memory() -> Self {
        DbConfig {
            database_url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// URL in the form sqlx parses; plain paths get the `sqlite://` scheme.
    fn connect_url(&self) -> String {
        if self.database_url.starts_with("sqlite:") {
            self.database_url.clone()
        } else {
            format!("sqlite://{}", self.database_url)
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

// =============================================================================
// Database
// =============================================================================

/// Open store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating the file if needed) and migrates the store.
    ///
    /// ## Errors
    /// - `DbError::ConnectionFailed` for an unparsable URL or an unreachable file
    /// - `DbError::MigrationFailed` when the schema cannot be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let url = config.connect_url();
        info!(%url, "Opening SQLite store");

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let max_lifetime = (!config.is_in_memory()).then_some(CONNECTION_MAX_LIFETIME);
        debug!(?max_lifetime, idle_timeout = ?config.idle_timeout, "Pool limits");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "SQLite pool ready");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations; already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Closes every connection. Queries issued afterwards fail.
    pub async fn close(&self) {
        info!("Closing SQLite pool");
        self.pool.close().await;
    }

    /// `true` while the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert!(db.items().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_makes_store_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_builder_keeps_other_fields() {
        let config = DbConfig::new("oblik.db")
            .max_connections(8)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_plain_paths_get_scheme() {
        assert_eq!(DbConfig::new("data/oblik.db").connect_url(), "sqlite://data/oblik.db");
        assert_eq!(DbConfig::new("sqlite://x.db").connect_url(), "sqlite://x.db");
        assert_eq!(DbConfig::in_memory().connect_url(), IN_MEMORY_URL);
    }
}
