//! # Statistics
//!
//! Profit/loss roll-ups over the full (unpaginated) inventory, plus the
//! per-item figures shown on an item's detail page and in the export.
//!
//! ## Formulas
//! ```text
//! expenses(item)   = cost_uah + customs_uah
//! unit_cost(item)  = expenses / initial_quantity      (0 when initial = 0)
//! income(item)     = sold_quantity × average_unit_price
//! profit(item)     = income − sold_quantity × unit_cost  (only if sold > 0)
//!
//! total_expenses   = Σ expenses
//! total_income     = Σ income
//! overall_profit   = total_income − total_expenses
//! unsold_value     = Σ remaining × unit_cost         (remaining > 0 only)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregation::sales_summary;
use crate::types::ItemWithSales;

// =============================================================================
// Inventory Statistics
// =============================================================================

/// Whole-inventory roll-up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryStats {
    pub item_count: i64,
    pub total_initial_units: i64,
    pub total_sold_units: i64,
    pub items_with_sales: i64,
    pub items_without_sales: i64,
    pub total_expenses: f64,
    pub total_income: f64,
    pub overall_profit: f64,
    pub unsold_value: f64,
}

/// Rolls up every item with its sales.
pub fn inventory_stats(items: &[ItemWithSales]) -> InventoryStats {
    let mut stats = InventoryStats::default();

    for entry in items {
        let figures = ItemStats::from(entry);

        stats.item_count += 1;
        stats.total_initial_units += entry.item.initial_quantity;
        stats.total_sold_units += figures.sold_quantity;
        if figures.sold_quantity > 0 {
            stats.items_with_sales += 1;
        } else {
            stats.items_without_sales += 1;
        }

        stats.total_expenses += figures.expenses;
        stats.total_income += figures.income;
        if figures.remaining_quantity > 0 {
            stats.unsold_value += figures.remaining_quantity as f64 * figures.unit_cost;
        }
    }

    stats.overall_profit = stats.total_income - stats.total_expenses;
    stats
}

// =============================================================================
// Per-Item Statistics
// =============================================================================

/// Figures for a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemStats {
    pub item_id: i64,
    pub name: String,
    pub expenses: f64,
    pub unit_cost: f64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub average_sale_price: f64,
    pub income: f64,
    /// Profit on the units sold so far; absent until something sells.
    pub profit: Option<f64>,
}

impl From<&ItemWithSales> for ItemStats {
    fn from(entry: &ItemWithSales) -> Self {
        let item = &entry.item;
        let summary = sales_summary(&entry.sales_history);
        let unit_cost = item.unit_cost();
        let sold = summary.total_quantity;
        let income = sold as f64 * summary.average_unit_price;

        ItemStats {
            item_id: item.id,
            name: item.name.clone(),
            expenses: item.total_expenses(),
            unit_cost,
            sold_quantity: sold,
            remaining_quantity: item.initial_quantity - sold,
            average_sale_price: summary.average_unit_price,
            income,
            profit: (sold > 0).then(|| income - sold as f64 * unit_cost),
        }
    }
}

// =============================================================================
// Export Rows
// =============================================================================

/// One row of the inventory export: the stored item plus computed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExportRow {
    pub id: i64,
    pub name: String,
    pub initial_quantity: i64,
    pub sold_quantity: i64,
    pub remaining_quantity: i64,
    pub origin_country: Option<String>,
    pub original_currency: Option<String>,
    pub cost_original: Option<f64>,
    pub shipping_original: Option<f64>,
    pub rate: Option<f64>,
    pub cost_uah: f64,
    pub customs_uah: f64,
    pub total_expenses_per_item: f64,
    pub avg_sell_price: f64,
    pub total_income_per_item: f64,
    pub profit_loss_per_item: Option<f64>,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Builds export rows in the order given.
pub fn export_rows(items: &[ItemWithSales]) -> Vec<ExportRow> {
    items
        .iter()
        .map(|entry| {
            let figures = ItemStats::from(entry);
            let item = &entry.item;

            ExportRow {
                id: item.id,
                name: item.name.clone(),
                initial_quantity: item.initial_quantity,
                sold_quantity: figures.sold_quantity,
                remaining_quantity: figures.remaining_quantity,
                origin_country: item.origin_country.clone(),
                original_currency: item.original_currency.clone(),
                cost_original: item.cost_original,
                shipping_original: item.shipping_original,
                rate: item.rate,
                cost_uah: item.cost_uah,
                customs_uah: item.customs_uah,
                total_expenses_per_item: figures.expenses,
                avg_sell_price: figures.average_sale_price,
                total_income_per_item: figures.income,
                profit_loss_per_item: figures.profit,
                description: item.description.clone(),
                created_at: item.created_at,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Item, Sale};
    use chrono::Utc;

    fn entry(id: i64, initial: i64, cost: f64, customs: f64, sales: &[(i64, f64)]) -> ItemWithSales {
        let item = Item {
            id,
            name: format!("item-{id}"),
            initial_quantity: initial,
            cost_uah: cost,
            customs_uah: customs,
            description: None,
            origin_country: Some("USA".to_string()),
            original_currency: Some("USD".to_string()),
            cost_original: None,
            shipping_original: None,
            rate: Some(42.0),
            created_at: Utc::now(),
        };
        let sales = sales
            .iter()
            .enumerate()
            .map(|(i, (qty, price))| Sale {
                id: i as i64 + 1,
                item_id: id,
                quantity_sold: *qty,
                price_per_unit_uah: *price,
                sale_timestamp: Utc::now(),
            })
            .collect();
        ItemWithSales::new(item, sales)
    }

    #[test]
    fn test_item_stats() {
        // 10 units for 900 + 100 customs → 100 per unit; sold 4 at 150
        let stats = ItemStats::from(&entry(1, 10, 900.0, 100.0, &[(4, 150.0)]));

        assert_eq!(stats.expenses, 1000.0);
        assert_eq!(stats.unit_cost, 100.0);
        assert_eq!(stats.sold_quantity, 4);
        assert_eq!(stats.remaining_quantity, 6);
        assert_eq!(stats.income, 600.0);
        assert_eq!(stats.profit, Some(200.0));
    }

    #[test]
    fn test_item_stats_without_sales_has_no_profit() {
        let stats = ItemStats::from(&entry(1, 3, 300.0, 0.0, &[]));
        assert_eq!(stats.profit, None);
        assert_eq!(stats.income, 0.0);
    }

    #[test]
    fn test_inventory_rollup() {
        let items = vec![
            entry(1, 10, 900.0, 100.0, &[(4, 150.0)]),
            entry(2, 2, 200.0, 0.0, &[]),
            entry(3, 0, 50.0, 0.0, &[]),
        ];
        let stats = inventory_stats(&items);

        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.total_initial_units, 12);
        assert_eq!(stats.total_sold_units, 4);
        assert_eq!(stats.items_with_sales, 1);
        assert_eq!(stats.items_without_sales, 2);
        assert_eq!(stats.total_expenses, 1250.0);
        assert_eq!(stats.total_income, 600.0);
        assert_eq!(stats.overall_profit, -650.0);
        // 6 × 100 + 2 × 100; the zero-quantity lot contributes nothing
        assert_eq!(stats.unsold_value, 800.0);
    }

    #[test]
    fn test_empty_inventory() {
        assert_eq!(inventory_stats(&[]), InventoryStats::default());
    }

    #[test]
    fn test_export_rows_carry_computed_columns() {
        let rows = export_rows(&[entry(7, 10, 900.0, 100.0, &[(2, 10.0), (3, 20.0)])]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
        assert_eq!(rows[0].avg_sell_price, 16.0);
        assert_eq!(rows[0].total_income_per_item, 80.0);
        assert_eq!(rows[0].profit_loss_per_item, Some(80.0 - 500.0));
    }
}
