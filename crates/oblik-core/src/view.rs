//! # View State Machine
//!
//! Navigation model for an interactive front end, independent of any widget
//! toolkit. Exactly one view is active; every user action is applied through
//! [`View::apply`], which either yields the next view (and possibly a write
//! the caller must perform) or rejects the action.
//!
//! ## Transitions
//! ```text
//!                      ┌───────────── Cancel / Saved ─────────────┐
//!                      │                                          │
//!  ┌─────────┐  Edit(id)  ┌──────────────┐                        │
//!  │         │───────────►│ Editing(id)  │────────────────────────┤
//!  │         │  Sell(id)  ┌──────────────┐                        │
//!  │         │───────────►│ Selling(id)  │────────────────────────┤
//!  │ Listing │ Delete(id) ┌─────────────────────┐ Confirm/Cancel  │
//!  │         │───────────►│ ConfirmingDelete(id)│─────────────────┤
//!  │         │◄───────────┴─────────────────────┴─────────────────┘
//!  │         │ History(id) ┌─────────────────────┐
//!  │         │────────────►│ ViewingHistory(id)  │──── Back ──► Listing
//!  └─────────┘             └──┬───────────────▲──┘
//!                   EditSale  │               │ Saved / Cancel / Confirm
//!                 DeleteSale  ▼               │
//!              ┌─────────────────────────────────────┐
//!              │ EditingSale(item, sale)             │
//!              │ ConfirmingSaleDelete(item, sale)    │
//!              └─────────────────────────────────────┘
//!
//!  Reset (from anywhere) ──► Listing   e.g. the item vanished meanwhile
//! ```
//!
//! Selling is only offered while an item has stock; the history only while
//! it has sales. Both guards are checked here, not left to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregation::StockLevel;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// States
// =============================================================================

/// The active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    #[default]
    Listing,
    Editing {
        item_id: i64,
    },
    Selling {
        item_id: i64,
    },
    ViewingHistory {
        item_id: i64,
    },
    EditingSale {
        item_id: i64,
        sale_id: i64,
    },
    ConfirmingDelete {
        item_id: i64,
    },
    ConfirmingSaleDelete {
        item_id: i64,
        sale_id: i64,
    },
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Listing => write!(f, "listing items"),
            View::Editing { item_id } => write!(f, "editing item {item_id}"),
            View::Selling { item_id } => write!(f, "selling item {item_id}"),
            View::ViewingHistory { item_id } => write!(f, "viewing sales of item {item_id}"),
            View::EditingSale { sale_id, .. } => write!(f, "editing sale {sale_id}"),
            View::ConfirmingDelete { item_id } => write!(f, "confirming deletion of item {item_id}"),
            View::ConfirmingSaleDelete { sale_id, .. } => {
                write!(f, "confirming deletion of sale {sale_id}")
            }
        }
    }
}

// =============================================================================
// Actions & Effects
// =============================================================================

/// A user action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewAction {
    Edit { item_id: i64 },
    Sell { item_id: i64, stock: StockLevel },
    ShowHistory { item_id: i64, stock: StockLevel },
    RequestDelete { item_id: i64 },
    EditSale { sale_id: i64 },
    RequestSaleDelete { sale_id: i64 },
    /// A form was submitted and its write succeeded.
    Saved,
    Confirm,
    Cancel,
    Back,
    Reset,
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewAction::Edit { .. } => "edit an item",
            ViewAction::Sell { .. } => "sell an item",
            ViewAction::ShowHistory { .. } => "show sales history",
            ViewAction::RequestDelete { .. } => "delete an item",
            ViewAction::EditSale { .. } => "edit a sale",
            ViewAction::RequestSaleDelete { .. } => "delete a sale",
            ViewAction::Saved => "save",
            ViewAction::Confirm => "confirm",
            ViewAction::Cancel => "cancel",
            ViewAction::Back => "go back",
            ViewAction::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// A write the caller must perform as part of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    DeleteItem { item_id: i64 },
    DeleteSale { item_id: i64, sale_id: i64 },
}

/// Outcome of an accepted action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: View,
    pub effect: Option<ViewEffect>,
}

impl Transition {
    fn to(next: View) -> Self {
        Transition { next, effect: None }
    }

    fn with(next: View, effect: ViewEffect) -> Self {
        Transition {
            next,
            effect: Some(effect),
        }
    }
}

// =============================================================================
// Transition Function
// =============================================================================

impl View {
    /// Applies an action to the current view.
    ///
    /// ## Returns
    /// The next view and any pending write, or
    /// [`CoreError::InvalidTransition`] when the action is not available.
    pub fn apply(self, action: ViewAction) -> CoreResult<Transition> {
        use ViewAction as A;

        let transition = match (self, action) {
            (_, A::Reset) => Transition::to(View::Listing),

            (View::Listing, A::Edit { item_id }) => Transition::to(View::Editing { item_id }),
            (View::Listing, A::Sell { item_id, stock }) if stock.can_sell() => {
                Transition::to(View::Selling { item_id })
            }
            (View::Listing, A::ShowHistory { item_id, stock }) if stock.has_sales() => {
                Transition::to(View::ViewingHistory { item_id })
            }
            (View::Listing, A::RequestDelete { item_id }) => {
                Transition::to(View::ConfirmingDelete { item_id })
            }

            (View::Editing { .. } | View::Selling { .. }, A::Saved | A::Cancel) => {
                Transition::to(View::Listing)
            }

            (View::ConfirmingDelete { item_id }, A::Confirm) => {
                Transition::with(View::Listing, ViewEffect::DeleteItem { item_id })
            }
            (View::ConfirmingDelete { .. }, A::Cancel) => Transition::to(View::Listing),

            (View::ViewingHistory { item_id }, A::EditSale { sale_id }) => {
                Transition::to(View::EditingSale { item_id, sale_id })
            }
            (View::ViewingHistory { item_id }, A::RequestSaleDelete { sale_id }) => {
                Transition::to(View::ConfirmingSaleDelete { item_id, sale_id })
            }
            (View::ViewingHistory { .. }, A::Back) => Transition::to(View::Listing),

            (View::EditingSale { item_id, .. }, A::Saved | A::Cancel) => {
                Transition::to(View::ViewingHistory { item_id })
            }

            (View::ConfirmingSaleDelete { item_id, sale_id }, A::Confirm) => Transition::with(
                View::ViewingHistory { item_id },
                ViewEffect::DeleteSale { item_id, sale_id },
            ),
            (View::ConfirmingSaleDelete { item_id, .. }, A::Cancel) => {
                Transition::to(View::ViewingHistory { item_id })
            }

            (state, action) => {
                return Err(CoreError::InvalidTransition {
                    state: state.to_string(),
                    action: action.to_string(),
                })
            }
        };

        Ok(transition)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
