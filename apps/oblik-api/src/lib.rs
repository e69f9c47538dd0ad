//! # oblik-api: REST Facade
//!
//! HTTP surface over [`oblik_db::Inventory`]. Handlers decode the request,
//! delegate to the inventory service and map failures to [`error::ApiError`].
//!
//! ## Startup
//! ```text
//! ApiConfig::load()  ──►  AppState::connect()  ──►  build_router()  ──►  axum::serve
//!                               │
//!                               └─ no URL / connect error → every data route answers 503
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use state::{AppState, SharedState};

/// Builds the application router.
pub fn build_router(state: SharedState) -> Router {
    routes::router(state)
}
