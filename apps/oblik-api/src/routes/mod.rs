//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /                          welcome message                      │
//! │  GET    /health                    store health                         │
//! │                                                                         │
//! │  GET    /products/                 page of item records                 │
//! │  GET    /inventory                 page with stock figures + status     │
//! │  POST   /items                     create item                          │
//! │  GET    /items/{id}                item record                          │
//! │  PUT    /items/{id}                replace item fields                  │
//! │  DELETE /items/{id}                delete item and its sales            │
//! │                                                                         │
//! │  GET    /items/{id}/sales          sales history                        │
//! │  POST   /items/{id}/sales          sell                                 │
//! │  GET    /items/{id}/suggested-price                                     │
//! │  PUT    /sales/{id}                edit sale                            │
//! │  DELETE /sales/{id}                delete sale                          │
//! │                                                                         │
//! │  GET    /stats                     inventory statistics                 │
//! │  GET    /items/{id}/stats          item statistics                      │
//! │  GET    /export                    export rows                          │
//! │                                                                         │
//! │  POST   /view                      navigation step for a front end      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod items;
pub mod reports;
pub mod root;
pub mod sales;
pub mod view;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

/// Builds the complete router over shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root::welcome))
        .route("/health", get(root::health))
        .route("/products", get(items::list_products))
        .route("/products/", get(items::list_products))
        .route("/inventory", get(items::list_inventory))
        .route("/items", post(items::create_item))
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route(
            "/items/{id}/sales",
            get(sales::list_sales).post(sales::sell),
        )
        .route("/items/{id}/suggested-price", get(sales::suggested_price))
        .route("/sales/{id}", put(sales::update_sale).delete(sales::delete_sale))
        .route("/stats", get(reports::inventory_stats))
        .route("/items/{id}/stats", get(reports::item_stats))
        .route("/export", get(reports::export))
        .route("/view", post(view::navigate))
        .with_state(state)
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use oblik_db::{Database, DbConfig, Inventory};

    use crate::state::AppState;

    /// Router over a fresh in-memory store.
    pub async fn app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        super::router(Arc::new(AppState::ready(Inventory::new(
            db,
            Duration::from_secs(60),
        ))))
    }

    /// Sends one request and returns status plus JSON body (`Null` if empty).
    pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Creates an item and returns its id.
    pub async fn create_item(app: &Router, name: &str, initial_quantity: i64) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/items",
            Some(serde_json::json!({
                "name": name,
                "initial_quantity": initial_quantity,
                "origin_country": "USA",
                "cost_original": 10.0,
                "shipping_original": 2.0,
                "customs_uah": 16.0,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}
