//! Statistics and export. All figures are computed over the full item set,
//! never over a page.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;

use oblik_core::stats::{ExportRow, InventoryStats, ItemStats};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// `GET /stats`
pub async fn inventory_stats(State(state): State<SharedState>) -> ApiResult<Json<InventoryStats>> {
    Ok(Json(state.inventory()?.stats().await?))
}

/// `GET /items/{id}/stats`
pub async fn item_stats(
    State(state): State<SharedState>,
    item_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ItemStats>> {
    let Path(item_id) = item_id?;
    state
        .inventory()?
        .item_stats(item_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item", item_id))
}

/// `GET /export`
pub async fn export(State(state): State<SharedState>) -> ApiResult<Json<Vec<ExportRow>>> {
    Ok(Json(state.inventory()?.export().await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{app, create_item, send};

    #[tokio::test]
    async fn test_stats_cover_every_item() {
        let app = app().await;
        // 504 + 16 = 520 UAH per lot
        let jacket = create_item(&app, "Jacket", 4).await;
        create_item(&app, "Scarf", 2).await;
        send(
            &app,
            "POST",
            &format!("/items/{jacket}/sales"),
            Some(json!({ "quantity_sold": 2, "price_per_unit_uah": 300.0 })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["item_count"], 2);
        assert_eq!(body["total_sold_units"], 2);
        assert_eq!(body["items_with_sales"], 1);
        assert_eq!(body["total_expenses"], 1040.0);
        assert_eq!(body["total_income"], 600.0);
        assert_eq!(body["overall_profit"], -440.0);
        // 2 × 130 (jacket) + 2 × 260 (scarf)
        assert_eq!(body["unsold_value"], 780.0);

        let (status, body) = send(&app, "GET", &format!("/items/{jacket}/stats"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unit_cost"], 130.0);
        assert_eq!(body["profit"], 340.0);
    }

    #[tokio::test]
    async fn test_export_rows() {
        let app = app().await;
        create_item(&app, "Jacket", 4).await;

        let (status, body) = send(&app, "GET", "/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Jacket");
        assert_eq!(body[0]["total_expenses_per_item"], 520.0);
        assert!(body[0]["profit_loss_per_item"].is_null());

        let (status, _) = send(&app, "GET", "/items/999/stats", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
