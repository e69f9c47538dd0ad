//! # Repository Module
//!
//! Database repository implementations for Oblik.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Inventory service                                                     │
//! │       │                                                                 │
//! │       │  db.items().list_page(&query)                                  │
//! │       ▼                                                                 │
//! │  ItemRepository                     SaleRepository                     │
//! │  ├── list_page / list_all           ├── list_for_item / list_for_items │
//! │  ├── get_by_id                      ├── get_by_id                      │
//! │  ├── insert                         ├── record      (checked, tx)      │
//! │  ├── update     (checked, tx)       ├── update      (checked, tx)      │
//! │  └── delete_with_sales (tx)         └── delete                         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read-modify-write operations run their stock checks and their write on
//! the same transaction, so two concurrent sells cannot both pass the check.

pub mod item;
pub mod sale;
