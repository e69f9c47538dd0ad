//! Sale endpoints.
//!
//! Stock rules are enforced below this layer inside one transaction per
//! write; handlers only decode, delegate and encode.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use oblik_core::{Sale, SaleForm};

use crate::error::ApiResult;
use crate::state::SharedState;

/// `GET /items/{id}/sales`: oldest first.
pub async fn list_sales(
    State(state): State<SharedState>,
    item_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Path(item_id) = item_id?;
    let sales = state.inventory()?.sales_history(item_id).await?;
    Ok(Json(sales))
}

/// `POST /items/{id}/sales`
pub async fn sell(
    State(state): State<SharedState>,
    item_id: Result<Path<i64>, PathRejection>,
    form: Result<Json<SaleForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Path(item_id) = item_id?;
    let Json(form) = form?;
    let sale = state.inventory()?.sell(item_id, &form).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Debug, Serialize)]
pub struct SuggestedPrice {
    pub item_id: i64,
    pub price_per_unit_uah: f64,
}

/// `GET /items/{id}/suggested-price`: value to pre-fill a sell form with.
pub async fn suggested_price(
    State(state): State<SharedState>,
    item_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<SuggestedPrice>> {
    let Path(item_id) = item_id?;
    let price = state.inventory()?.suggested_price(item_id).await?;
    Ok(Json(SuggestedPrice {
        item_id,
        price_per_unit_uah: price,
    }))
}

/// `PUT /sales/{id}`
pub async fn update_sale(
    State(state): State<SharedState>,
    sale_id: Result<Path<i64>, PathRejection>,
    form: Result<Json<SaleForm>, JsonRejection>,
) -> ApiResult<Json<Sale>> {
    let Path(sale_id) = sale_id?;
    let Json(form) = form?;
    let sale = state.inventory()?.update_sale(sale_id, &form).await?;
    Ok(Json(sale))
}

/// `DELETE /sales/{id}`
pub async fn delete_sale(
    State(state): State<SharedState>,
    sale_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(sale_id) = sale_id?;
    state.inventory()?.delete_sale(sale_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::routes::test_support::{app, create_item, send};

    fn sale(quantity: i64, price: f64) -> Option<Value> {
        Some(json!({ "quantity_sold": quantity, "price_per_unit_uah": price }))
    }

    #[tokio::test]
    async fn test_sell_down_to_zero() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 5).await;
        let uri = format!("/items/{id}/sales");

        let (status, body) = send(&app, "POST", &uri, sale(6, 100.0)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (status, body) = send(&app, "POST", &uri, sale(5, 100.0)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["item_id"], id);

        let (_, body) = send(&app, "GET", "/inventory", None).await;
        assert_eq!(body[0]["remaining_quantity"], 0);
        assert_eq!(body[0]["can_sell"], false);

        let (status, _) = send(&app, "POST", &uri, sale(1, 100.0)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_edit_sale_excludes_itself() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 10).await;
        let uri = format!("/items/{id}/sales");

        let (_, a) = send(&app, "POST", &uri, sale(3, 100.0)).await;
        send(&app, "POST", &uri, sale(4, 120.0)).await;
        let a_uri = format!("/sales/{}", a["id"]);

        let (status, _) = send(&app, "PUT", &a_uri, sale(7, 100.0)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "PUT", &a_uri, sale(6, 110.0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity_sold"], 6);
        assert_eq!(body["price_per_unit_uah"], 110.0);
    }

    #[tokio::test]
    async fn test_history_suggestion_and_delete() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 10).await;
        let uri = format!("/items/{id}/sales");
        send(&app, "POST", &uri, sale(1, 100.0)).await;
        let (_, last) = send(&app, "POST", &uri, sale(2, 150.0)).await;

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(&app, "GET", &format!("/items/{id}/suggested-price"), None).await;
        assert_eq!(body["price_per_unit_uah"], 150.0);

        let (status, _) = send(&app, "DELETE", &format!("/sales/{}", last["id"]), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_sale_forms() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 10).await;
        let uri = format!("/items/{id}/sales");

        let (status, _) = send(&app, "POST", &uri, sale(0, 100.0)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", &uri, Some(json!({ "quantity_sold": "two" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/items/999/sales", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "PUT", "/sales/999", sale(1, 1.0)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
