//! Item endpoints: listings, detail, create, update, delete.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use oblik_core::validation::{validate_page_size, validate_search_query};
use oblik_core::{Item, ItemForm, ItemOverview, ItemQuery, StockFilter, DEFAULT_PAGE_SIZE};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Query string of the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    pub limit: Option<u32>,
    pub search: Option<String>,
    /// `all`, `in_stock` or `sold`; only read by `/inventory`.
    pub status: Option<String>,
}

impl ListParams {
    fn into_query(self, filter: StockFilter) -> ApiResult<ItemQuery> {
        Ok(ItemQuery {
            skip: self.skip,
            limit: validate_page_size(self.limit.unwrap_or(DEFAULT_PAGE_SIZE)).map_err(core)?,
            search: validate_search_query(self.search.as_deref().unwrap_or_default())
                .map_err(core)?,
            filter,
        })
    }
}

fn core(err: oblik_core::ValidationError) -> ApiError {
    ApiError::from(oblik_core::CoreError::from(err))
}

/// `GET /products/`: one page of plain item records, ordered by id.
pub async fn list_products(
    State(state): State<SharedState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Item>>> {
    let Query(params) = params?;
    let inventory = state.inventory()?;
    let query = params.into_query(StockFilter::All)?;

    let rows = inventory.page(&query).await?;
    debug!(skip = query.skip, limit = query.limit, count = rows.len(), "Products listed");

    Ok(Json(rows.into_iter().map(|row| row.item).collect()))
}

/// `GET /inventory`: one page with sold/remaining figures, filterable by
/// stock status.
pub async fn list_inventory(
    State(state): State<SharedState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ItemOverview>>> {
    let Query(mut params) = params?;
    let inventory = state.inventory()?;

    let filter: StockFilter = params
        .status
        .take()
        .unwrap_or_default()
        .parse()
        .map_err(core)?;
    let query = params.into_query(filter)?;

    let rows = inventory.page(&query).await?;
    Ok(Json(rows.iter().map(ItemOverview::from).collect()))
}

/// `GET /items/{id}`
pub async fn get_item(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Item>> {
    let Path(id) = id?;
    let inventory = state.inventory()?;

    inventory
        .item(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Item", id))
}

/// `POST /items`
pub async fn create_item(
    State(state): State<SharedState>,
    form: Result<Json<ItemForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let Json(form) = form?;
    let item = state.inventory()?.create_item(&form).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /items/{id}`
pub async fn update_item(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
    form: Result<Json<ItemForm>, JsonRejection>,
) -> ApiResult<Json<Item>> {
    let Path(id) = id?;
    let Json(form) = form?;
    let item = state.inventory()?.update_item(id, &form).await?;
    Ok(Json(item))
}

/// `DELETE /items/{id}`: removes the item and its sales.
pub async fn delete_item(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.inventory()?.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{app, create_item, send};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_get_item_and_missing_item() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 3).await;

        let (status, body) = send(&app, "GET", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Jacket");
        assert_eq!(body["cost_uah"], 504.0);
        assert_eq!(body["original_currency"], "USD");

        let (status, body) = send(&app, "GET", "/items/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_products_pagination_and_search() {
        let app = app().await;
        for name in ["Куртка", "Кросівки", "Шарф"] {
            create_item(&app, name, 1).await;
        }

        let (status, body) = send(&app, "GET", "/products/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (_, body) = send(&app, "GET", "/products/?skip=1&limit=1", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Кросівки");

        let (_, body) = send(&app, "GET", "/products/?search=%D0%BA%D1%80", None).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Кросівки"]);
    }

    #[tokio::test]
    async fn test_products_rejects_bad_paging() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/products/?limit=101", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, "GET", "/products/?skip=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inventory_status_filter() {
        let app = app().await;
        let sold_out = create_item(&app, "Boots", 1).await;
        create_item(&app, "Scarf", 2).await;
        send(
            &app,
            "POST",
            &format!("/items/{sold_out}/sales"),
            Some(json!({ "quantity_sold": 1, "price_per_unit_uah": 900.0 })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/inventory?status=sold", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Boots");
        assert_eq!(body[0]["remaining_quantity"], 0);
        assert_eq!(body[0]["can_sell"], false);

        let (_, body) = send(&app, "GET", "/inventory?status=in_stock", None).await;
        assert_eq!(body[0]["name"], "Scarf");

        let (status, _) = send(&app, "GET", "/inventory?status=gone", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_validation_is_repeatable() {
        let app = app().await;
        let form = json!({ "name": "  ", "initial_quantity": 1, "rate": 40.0 });

        for _ in 0..2 {
            let (status, body) = send(&app, "POST", "/items", Some(form.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "name is required");
        }

        let (_, body) = send(&app, "GET", "/products/", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_below_sold_is_rejected() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 5).await;
        send(
            &app,
            "POST",
            &format!("/items/{id}/sales"),
            Some(json!({ "quantity_sold": 4, "price_per_unit_uah": 100.0 })),
        )
        .await;

        let form = json!({ "name": "Jacket", "initial_quantity": 3, "rate": 40.0 });
        let (status, body) = send(&app, "PUT", &format!("/items/{id}"), Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_LOGIC");

        let form = json!({ "name": "Jacket XL", "initial_quantity": 4, "cost_original": 10.0, "rate": 40.0 });
        let (status, body) = send(&app, "PUT", &format!("/items/{id}"), Some(form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Jacket XL");
        assert_eq!(body["cost_uah"], 400.0);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let app = app().await;
        let id = create_item(&app, "Jacket", 1).await;

        let (status, _) = send(&app, "DELETE", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/items/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let app = crate::routes::router(Arc::new(AppState::unavailable("client not initialized")));

        let (status, body) = send(&app, "GET", "/items/1", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");

        let (status, _) = send(&app, "GET", "/products/", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
