//! # oblik-db: Database Layer for Oblik
//!
//! This crate provides database access for Oblik.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oblik Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (GET /inventory)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     oblik-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Inventory   │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (inventory.rs)│    │ (item, sale)  │    │  (embedded)  │  │   │
//! │  │   │               │───►│               │    │              │  │   │
//! │  │   │  ReadCache    │    │ ItemRepo      │    │ 001_initial  │  │   │
//! │  │   │  (cache.rs)   │    │ SaleRepo      │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │  Database (pool.rs)          │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Item and sale repositories
//! - [`cache`] - Time-boxed read cache with targeted invalidation
//! - [`inventory`] - Service combining the above
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oblik_db::{Database, DbConfig, Inventory};
//!
//! let db = Database::new(DbConfig::new("sqlite://oblik.db")).await?;
//! let inventory = Inventory::new(db, Duration::from_secs(60));
//!
//! let page = inventory.page(&query).await?;
//! inventory.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod error;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use inventory::Inventory;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::sale::SaleRepository;
