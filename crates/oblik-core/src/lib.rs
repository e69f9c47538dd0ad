//! # oblik-core: Pure Business Logic for Oblik
//!
//! This crate holds every calculation the bookkeeping application performs,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oblik Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    REST facade (axum)                           │   │
//! │  │   /products/  /items/{id}  /items/{id}/sales  /stats  /export   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ oblik-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │    cost    │  │ aggregate │  │ validation│  │   │
//! │  │   │   Item    │  │  uah_cost  │  │  summary  │  │   rules   │  │   │
//! │  │   │   Sale    │  │  profiles  │  │   stats   │  │   view    │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    oblik-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, repositories, cache         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Item, Sale) and their input forms
//! - [`cost`] - UAH cost conversion and origin-country currency profiles
//! - [`aggregation`] - Sales summaries and per-item stock levels
//! - [`stats`] - Inventory-wide and per-item profit/loss rollups
//! - [`validation`] - Business rule validation (forms, sell, edit-sale)
//! - [`view`] - Navigation state machine for an interactive front end
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use oblik_core::cost::uah_cost;
//!
//! // 100 USD + 20 USD shipping at 41.5 UAH/USD
//! let cost = uah_cost(Some(100.0), Some(20.0), Some(41.5));
//! assert_eq!(cost, 4980.0);
//!
//! // Non-positive rate never produces a figure
//! assert_eq!(uah_cost(Some(100.0), Some(20.0), Some(0.0)), 0.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod cost;
pub mod error;
pub mod stats;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregation::{sales_summary, SaleLine, SalesSummary, StockLevel};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an item name.
pub const MAX_NAME_LEN: usize = 200;

/// Page size used when a listing request does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single listing page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a name search term.
pub const MAX_SEARCH_LEN: usize = 100;
