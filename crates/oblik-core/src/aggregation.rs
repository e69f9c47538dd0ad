//! # Sales Aggregation
//!
//! Pure roll-ups over an item's already-loaded sales history.
//!
//! ## Data Flow
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────────────┐
//! │ sales rows   │────►│  sales_summary  │────►│ SalesSummary         │
//! │ (Sale/JSON)  │     │  skip malformed │     │  total_quantity      │
//! └──────────────┘     └─────────────────┘     │  average_unit_price  │
//!                                              └──────────┬───────────┘
//!                                                         │
//!                       initial_quantity ────────────────►▼
//!                                              ┌──────────────────────┐
//!                                              │ StockLevel           │
//!                                              │  sold / remaining    │
//!                                              │  has_sales/can_sell  │
//!                                              └──────────────────────┘
//! ```
//!
//! Records arrive either as typed [`Sale`] rows or as loosely-typed JSON (for
//! example from an import or a cached payload). The [`SaleLine`] trait lets
//! both go through the same summary, and a record whose quantity or price is
//! not numeric is logged and skipped rather than failing the whole roll-up.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ts_rs::TS;

use crate::types::Sale;

// =============================================================================
// Sale Line Abstraction
// =============================================================================

/// Anything that can contribute a quantity and unit price to a summary.
///
/// Returning `None` from either accessor marks the record as malformed.
pub trait SaleLine {
    fn quantity(&self) -> Option<i64>;
    fn unit_price(&self) -> Option<f64>;
}

impl SaleLine for Sale {
    fn quantity(&self) -> Option<i64> {
        Some(self.quantity_sold)
    }

    fn unit_price(&self) -> Option<f64> {
        self.price_per_unit_uah
            .is_finite()
            .then_some(self.price_per_unit_uah)
    }
}

const I64_RANGE_F64: (f64, f64) = (-9_223_372_036_854_775_808.0, 9_223_372_036_854_775_808.0);

/// JSON records: an absent field counts as zero, a non-numeric one is malformed.
impl SaleLine for Value {
    fn quantity(&self) -> Option<i64> {
        match self.get("quantity_sold") {
            None => Some(0),
            Some(Value::Number(n)) => n.as_i64().or_else(|| {
                // -2^63 <= f < 2^63; anything outside would saturate
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= I64_RANGE_F64.0 && *f < I64_RANGE_F64.1)
                    .map(|f| f as i64)
            }),
            Some(_) => None,
        }
    }

    fn unit_price(&self) -> Option<f64> {
        match self.get("price_per_unit_uah") {
            None => Some(0.0),
            Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()),
            Some(_) => None,
        }
    }
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Total units sold and their quantity-weighted average price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub total_quantity: i64,
    pub average_unit_price: f64,
}

/// Summarizes a sales history.
///
/// ## Arguments
/// * `sales` - Sale records in any order
///
/// ## Returns
/// `(0, 0.0)` for an empty history or one with no valid units; otherwise the
/// summed quantity and `Σ(qty × price) / Σ qty` over the well-formed records.
pub fn sales_summary<'a, S, I>(sales: I) -> SalesSummary
where
    S: SaleLine + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let mut total_quantity: i64 = 0;
    let mut total_value = 0.0;

    for sale in sales {
        match (sale.quantity(), sale.unit_price()) {
            (Some(qty), Some(price)) => match total_quantity.checked_add(qty) {
                Some(total) => {
                    total_quantity = total;
                    total_value += qty as f64 * price;
                }
                None => {
                    warn!(qty, total_quantity, "Skipping sale record that overflows the total");
                }
            },
            (qty, price) => {
                warn!(?qty, ?price, "Skipping sale record with non-numeric fields");
            }
        }
    }

    let average_unit_price = if total_quantity > 0 {
        total_value / total_quantity as f64
    } else {
        0.0
    };

    SalesSummary {
        total_quantity,
        average_unit_price,
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Derived stock figures of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLevel {
    pub initial: i64,
    pub sold: i64,
    pub remaining: i64,
}

impl StockLevel {
    pub fn new(initial: i64, sold: i64) -> Self {
        StockLevel {
            initial,
            sold,
            remaining: initial - sold,
        }
    }

    #[inline]
    pub fn has_sales(&self) -> bool {
        self.sold > 0
    }

    #[inline]
    pub fn can_sell(&self) -> bool {
        self.remaining > 0
    }
}

// =============================================================================
// Price Suggestion
// =============================================================================

/// Unit price to pre-fill a new sale with.
///
/// The most recent sale's price wins; with no sales yet, falls back to the
/// (zero) average.
pub fn suggested_unit_price(sales_history: &[Sale]) -> f64 {
    sales_history
        .iter()
        .max_by_key(|s| (s.sale_timestamp, s.id))
        .map(|s| s.price_per_unit_uah)
        .unwrap_or_else(|| sales_summary(sales_history).average_unit_price)
}

// =============================================================================
// Unit Tests
// =============================================================================
