//! # Domain Types
//!
//! Core domain types used throughout Oblik.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │        Item          │ 1    * │        Sale          │              │
//! │  │  ──────────────────  │───────►│  ──────────────────  │              │
//! │  │  id (store-assigned) │        │  id                  │              │
//! │  │  name                │        │  item_id (FK)        │              │
//! │  │  initial_quantity    │        │  quantity_sold       │              │
//! │  │  cost_uah (derived)  │        │  price_per_unit_uah  │              │
//! │  │  customs_uah         │        │  sale_timestamp      │              │
//! │  └──────────────────────┘        └──────────────────────┘              │
//! │                                                                         │
//! │  Inputs:   ItemForm → ItemDraft (validated, cost_uah computed)          │
//! │            SaleForm (quantity + unit price)                            │
//! │  Views:    ItemWithSales, ItemOverview, StockFilter                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are store-assigned integers. Amounts are UAH floats; the
//! original-currency fields are kept only as a record of the purchase.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregation::{sales_summary, StockLevel};
use crate::error::ValidationError;

// =============================================================================
// Item
// =============================================================================

/// A purchased inventory lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display label.
    pub name: String,

    /// Units originally acquired.
    pub initial_quantity: i64,

    /// Purchase cost converted to UAH when the item was written.
    pub cost_uah: f64,

    /// Customs and other local costs, already in UAH.
    pub customs_uah: f64,

    pub description: Option<String>,
    pub origin_country: Option<String>,
    pub original_currency: Option<String>,
    pub cost_original: Option<f64>,
    pub shipping_original: Option<f64>,

    /// UAH per unit of the original currency at acquisition time.
    pub rate: Option<f64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Everything paid for the lot: converted cost plus customs.
    #[inline]
    pub fn total_expenses(&self) -> f64 {
        self.cost_uah + self.customs_uah
    }

    /// Expense share of a single unit; zero for an empty lot.
    pub fn unit_cost(&self) -> f64 {
        if self.initial_quantity > 0 {
            self.total_expenses() / self.initial_quantity as f64
        } else {
            0.0
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One sale transaction against an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,

    /// Owning item. Never changes after the sale is recorded.
    pub item_id: i64,

    pub quantity_sold: i64,
    pub price_per_unit_uah: f64,

    #[ts(as = "String")]
    pub sale_timestamp: DateTime<Utc>,
}

// =============================================================================
// Item With Sales
// =============================================================================

/// An item with its sales denormalized into it.
///
/// This is the shape every presentation path works with: the data access
/// layer loads items, then attaches each one's sales history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemWithSales {
    #[serde(flatten)]
    pub item: Item,

    /// Sales ordered by timestamp, oldest first.
    pub sales_history: Vec<Sale>,
}

impl ItemWithSales {
    pub fn new(item: Item, sales_history: Vec<Sale>) -> Self {
        Self {
            item,
            sales_history,
        }
    }

    /// Sold / remaining / can-sell figures for this item.
    pub fn stock(&self) -> StockLevel {
        StockLevel::new(
            self.item.initial_quantity,
            sales_summary(&self.sales_history).total_quantity,
        )
    }
}

// =============================================================================
// Item Overview
// =============================================================================

/// Listing row: an item plus the figures derived from its sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemOverview {
    #[serde(flatten)]
    pub item: Item,

    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub has_sales: bool,
    pub can_sell: bool,
    pub average_sale_price: f64,
}

impl From<&ItemWithSales> for ItemOverview {
    fn from(entry: &ItemWithSales) -> Self {
        let summary = sales_summary(&entry.sales_history);
        let stock = StockLevel::new(entry.item.initial_quantity, summary.total_quantity);

        ItemOverview {
            item: entry.item.clone(),
            sold_quantity: stock.sold,
            remaining_quantity: stock.remaining,
            has_sales: stock.has_sales(),
            can_sell: stock.can_sell(),
            average_sale_price: summary.average_unit_price,
        }
    }
}

// =============================================================================
// Stock Filter
// =============================================================================

/// Listing filter over derived stock figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    /// Every item.
    #[default]
    All,
    /// Items with units left to sell.
    InStock,
    /// Items with at least one unit sold.
    Sold,
}

impl StockFilter {
    pub const ALL_NAMES: [&'static str; 3] = ["all", "in_stock", "sold"];

    /// Whether an item with the given stock figures passes this filter.
    pub fn matches(&self, stock: &StockLevel) -> bool {
        match self {
            StockFilter::All => true,
            StockFilter::InStock => stock.can_sell(),
            StockFilter::Sold => stock.has_sales(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockFilter::All => "all",
            StockFilter::InStock => "in_stock",
            StockFilter::Sold => "sold",
        }
    }
}

impl fmt::Display for StockFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StockFilter::All),
            "in_stock" => Ok(StockFilter::InStock),
            "sold" => Ok(StockFilter::Sold),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: Self::ALL_NAMES.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Listing Query
// =============================================================================

/// A page request over the item listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemQuery {
    pub skip: u32,
    pub limit: u32,
    /// Case-insensitive name substring, already trimmed; `None` when blank.
    pub search: Option<String>,
    pub filter: StockFilter,
}

// =============================================================================
// Input Forms
// =============================================================================

/// Item create/update input as submitted by a client.
///
/// Country-dependent fields may be omitted; [`crate::validation::validate_item_form`]
/// fills them from the origin country's currency profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemForm {
    pub name: String,
    pub initial_quantity: i64,
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub original_currency: Option<String>,
    #[serde(default)]
    pub cost_original: Option<f64>,
    #[serde(default)]
    pub shipping_original: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub customs_uah: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A validated item, ready to be written. `cost_uah` is already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub initial_quantity: i64,
    pub cost_uah: f64,
    pub customs_uah: f64,
    pub description: Option<String>,
    pub origin_country: Option<String>,
    pub original_currency: Option<String>,
    pub cost_original: Option<f64>,
    pub shipping_original: Option<f64>,
    pub rate: Option<f64>,
}

/// Sell / edit-sale input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleForm {
    pub quantity_sold: i64,
    pub price_per_unit_uah: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(initial_quantity: i64, cost_uah: f64, customs_uah: f64) -> Item {
        Item {
            id: 1,
            name: "Lamp".to_string(),
            initial_quantity,
            cost_uah,
            customs_uah,
            description: None,
            origin_country: None,
            original_currency: None,
            cost_original: None,
            shipping_original: None,
            rate: None,
            created_at: Utc::now(),
        }
    }

    fn sale(id: i64, quantity_sold: i64, price: f64) -> Sale {
        Sale {
            id,
            item_id: 1,
            quantity_sold,
            price_per_unit_uah: price,
            sale_timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_unit_cost() {
        assert_eq!(item(4, 900.0, 100.0).unit_cost(), 250.0);
        assert_eq!(item(0, 900.0, 100.0).unit_cost(), 0.0);
    }

    #[test]
    fn test_overview_from_sales() {
        let entry = ItemWithSales::new(item(10, 1000.0, 0.0), vec![sale(1, 2, 10.0), sale(2, 3, 20.0)]);
        let overview = ItemOverview::from(&entry);

        assert_eq!(overview.sold_quantity, 5);
        assert_eq!(overview.remaining_quantity, 5);
        assert!(overview.has_sales);
        assert!(overview.can_sell);
        assert_eq!(overview.average_sale_price, 16.0);
    }

    #[test]
    fn test_overview_serializes_flat() {
        let entry = ItemWithSales::new(item(3, 0.0, 0.0), vec![]);
        let json = serde_json::to_value(ItemOverview::from(&entry)).unwrap();

        assert_eq!(json["name"], "Lamp");
        assert_eq!(json["remaining_quantity"], 3);
        assert_eq!(json["has_sales"], false);
    }

    #[test]
    fn test_stock_filter_parse() {
        assert_eq!("in_stock".parse::<StockFilter>().unwrap(), StockFilter::InStock);
        assert_eq!("SOLD".parse::<StockFilter>().unwrap(), StockFilter::Sold);
        assert_eq!("".parse::<StockFilter>().unwrap(), StockFilter::All);
        assert!("gone".parse::<StockFilter>().is_err());
    }

    #[test]
    fn test_stock_filter_matches() {
        let fresh = StockLevel::new(5, 0);
        let sold_out = StockLevel::new(5, 5);

        assert!(StockFilter::InStock.matches(&fresh));
        assert!(!StockFilter::Sold.matches(&fresh));
        assert!(!StockFilter::InStock.matches(&sold_out));
        assert!(StockFilter::Sold.matches(&sold_out));
        assert!(StockFilter::All.matches(&sold_out));
    }
}
