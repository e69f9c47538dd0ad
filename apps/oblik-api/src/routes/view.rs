//! Navigation endpoint for interactive front ends.
//!
//! The client sends the view it is showing and what the user did; the
//! server looks up the stock figures the guards need, applies the
//! transition, performs any confirmed delete, and answers with the next
//! view.
//!
//! ```text
//! POST /view  { "current": { "view": "listing" },
//!               "action":  { "action": "sell", "item_id": 3 } }
//!
//!        ──►  { "view": { "view": "selling", "item_id": 3 } }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use oblik_core::view::{View, ViewAction, ViewEffect};
use oblik_core::StockLevel;
use oblik_db::Inventory;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// What the user did. Stock figures are never taken from the client.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Edit { item_id: i64 },
    Sell { item_id: i64 },
    ShowHistory { item_id: i64 },
    RequestDelete { item_id: i64 },
    EditSale { sale_id: i64 },
    RequestSaleDelete { sale_id: i64 },
    Saved,
    Confirm,
    Cancel,
    Back,
    Reset,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    #[serde(default)]
    pub current: View,
    pub action: ActionRequest,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    pub view: View,
}

/// `POST /view`
pub async fn navigate(
    State(state): State<SharedState>,
    request: Result<Json<NavigateRequest>, JsonRejection>,
) -> ApiResult<Json<NavigateResponse>> {
    let Json(request) = request?;
    let inventory = state.inventory()?;

    let action = resolve(inventory, &request).await?;
    let transition = request.current.apply(action)?;

    match transition.effect {
        Some(ViewEffect::DeleteItem { item_id }) => inventory.delete_item(item_id).await?,
        Some(ViewEffect::DeleteSale { item_id, sale_id }) => {
            // The confirmed view comes from the client; re-check ownership
            ensure_sale_of_item(inventory, item_id, sale_id).await?;
            inventory.delete_sale(sale_id).await?
        }
        None => {}
    }

    debug!(from = %request.current, to = %transition.next, "View changed");
    Ok(Json(NavigateResponse {
        view: transition.next,
    }))
}

/// Turns the client's action into a core action, loading what the guards
/// check.
async fn resolve(inventory: &Inventory, request: &NavigateRequest) -> ApiResult<ViewAction> {
    use ActionRequest as R;

    let action = match request.action {
        R::Edit { item_id } => ViewAction::Edit { item_id },
        R::Sell { item_id } => ViewAction::Sell {
            item_id,
            stock: stock_of(inventory, item_id).await?,
        },
        R::ShowHistory { item_id } => ViewAction::ShowHistory {
            item_id,
            stock: stock_of(inventory, item_id).await?,
        },
        R::RequestDelete { item_id } => ViewAction::RequestDelete { item_id },
        R::EditSale { sale_id } => {
            ensure_sale_of_current_item(inventory, request.current, sale_id).await?;
            ViewAction::EditSale { sale_id }
        }
        R::RequestSaleDelete { sale_id } => {
            ensure_sale_of_current_item(inventory, request.current, sale_id).await?;
            ViewAction::RequestSaleDelete { sale_id }
        }
        R::Saved => ViewAction::Saved,
        R::Confirm => ViewAction::Confirm,
        R::Cancel => ViewAction::Cancel,
        R::Back => ViewAction::Back,
        R::Reset => ViewAction::Reset,
    };
    Ok(action)
}

async fn stock_of(inventory: &Inventory, item_id: i64) -> ApiResult<StockLevel> {
    inventory
        .item_with_sales(item_id)
        .await?
        .map(|entry| entry.stock())
        .ok_or_else(|| ApiError::not_found("Item", item_id))
}

async fn ensure_sale_of_current_item(
    inventory: &Inventory,
    current: View,
    sale_id: i64,
) -> ApiResult<()> {
    // Other views reject the action in the state machine itself
    match current {
        View::ViewingHistory { item_id } => ensure_sale_of_item(inventory, item_id, sale_id).await,
        _ => Ok(()),
    }
}

async fn ensure_sale_of_item(inventory: &Inventory, item_id: i64, sale_id: i64) -> ApiResult<()> {
    let sales = inventory.sales_history(item_id).await?;
    if sales.iter().any(|sale| sale.id == sale_id) {
        Ok(())
    } else {
        Err(ApiError::not_found("Sale", sale_id))
    }
}
