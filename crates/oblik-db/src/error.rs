//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Stock rule (CoreError)              │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in oblik-api) ← Serialized for HTTP clients                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use oblik_core::CoreError;
use thiserror::Error;

/// Failures of a store operation.
///
/// Business-rule rejections travel inside [`DbError::Rejected`]; everything
/// else describes what went wrong talking to SQLite.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A sale would reference an item that does not exist.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A column CHECK failed (negative stock, zero quantity sold, ...).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Refused by validation or a stock rule; nothing was written.
    ///
    /// ```text
    /// sell 6 of 5 left    ──► Rejected(InsufficientStock)
    /// sale A: 3 → 7       ──► Rejected(InsufficientStock)
    /// initial 10 → 2      ──► Rejected(QuantityBelowSold)
    /// name "   "          ──► Rejected(Validation(Required))
    /// ```
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed; the write did not happen.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Timed out waiting for a pooled connection.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether the error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<oblik_core::ValidationError> for DbError {
    fn from(err: oblik_core::ValidationError) -> Self {
        DbError::Rejected(CoreError::Validation(err))
    }
}

/// ```text
/// RowNotFound                       → NotFound
/// Database("FOREIGN KEY ... failed") → ForeignKeyViolation
/// Database("CHECK ... failed")       → CheckViolation
/// Database(other)                    → QueryFailed
/// PoolTimedOut / PoolClosed          → PoolExhausted / ConnectionFailed
/// anything else                      → Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
