//! # Inventory Service
//!
//! The single entry point the API layer talks to: validated writes over the
//! repositories, reads through the [`ReadCache`], and the statistics built
//! from both.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Inventory ──read──► ReadCache ──miss──► ItemRepository / SaleRepository│
//! │     │                    ▲                                              │
//! │     │                    └── put (page, item, sales, full listing)      │
//! │     │                                                                   │
//! │     └──write──► validate (oblik-core) ──► repository (transaction)      │
//! │                                   │                                     │
//! │                                   └──► cache.invalidate(ItemChange)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{ItemChange, ReadCache};
use crate::error::{DbError, DbResult};
use crate::pool::Database;
use oblik_core::aggregation::suggested_unit_price;
use oblik_core::stats::{export_rows, inventory_stats, ExportRow, InventoryStats, ItemStats};
use oblik_core::validation::validate_item_form;
use oblik_core::{Item, ItemForm, ItemQuery, ItemWithSales, Sale, SaleForm};

/// Database handle plus read cache.
#[derive(Debug, Clone)]
pub struct Inventory {
    db: Database,
    cache: ReadCache,
}

impl Inventory {
    /// Wraps an open database with a read cache of the given TTL.
    pub fn new(db: Database, cache_ttl: Duration) -> Self {
        info!(ttl_ms = cache_ttl.as_millis() as u64, "Inventory service ready");
        Inventory {
            db,
            cache: ReadCache::new(cache_ttl),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn health_check(&self) -> bool {
        self.db.health_check().await
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an item record.
    pub async fn item(&self, id: i64) -> DbResult<Option<Item>> {
        if let Some(item) = self.cache.item(id).await {
            debug!(id, "Item served from cache");
            return Ok(Some(item));
        }

        let generation = self.cache.generation();
        let item = self.db.items().get_by_id(id).await?;
        if let Some(item) = &item {
            self.cache.put_item(item.clone(), generation).await;
        }
        Ok(item)
    }

    /// Gets an item's sales history, oldest first.
    ///
    /// ## Errors
    /// `DbError::NotFound` when the item does not exist.
    pub async fn sales_history(&self, item_id: i64) -> DbResult<Vec<Sale>> {
        if self.item(item_id).await?.is_none() {
            return Err(DbError::not_found("Item", item_id));
        }

        if let Some(sales) = self.cache.sales(item_id).await {
            return Ok(sales);
        }

        let generation = self.cache.generation();
        let sales = self.db.sales().list_for_item(item_id).await?;
        self.cache.put_sales(item_id, sales.clone(), generation).await;
        Ok(sales)
    }

    /// Gets an item with its sales denormalized into it.
    pub async fn item_with_sales(&self, id: i64) -> DbResult<Option<ItemWithSales>> {
        let Some(item) = self.item(id).await? else {
            return Ok(None);
        };
        let sales = self.sales_history(id).await?;
        Ok(Some(ItemWithSales::new(item, sales)))
    }

    /// Lists one page of items, each with its sales history.
    pub async fn page(&self, query: &ItemQuery) -> DbResult<Vec<ItemWithSales>> {
        if let Some(rows) = self.cache.page(query).await {
            debug!(?query, "Page served from cache");
            return Ok(rows);
        }

        let generation = self.cache.generation();
        let items = self.db.items().list_page(query).await?;
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let sales = self.db.sales().list_for_items(&ids).await?;
        let rows = attach_sales(items, sales);

        self.cache.put_page(query.clone(), rows.clone(), generation).await;
        Ok(rows)
    }

    /// Every item with its sales, for statistics and export.
    pub async fn full_listing(&self) -> DbResult<Vec<ItemWithSales>> {
        if let Some(rows) = self.cache.full_listing().await {
            return Ok(rows);
        }

        let generation = self.cache.generation();
        let items = self.db.items().list_all().await?;
        let sales = self.db.sales().list_all().await?;
        let rows = attach_sales(items, sales);

        self.cache.put_full_listing(rows.clone(), generation).await;
        Ok(rows)
    }

    /// Inventory-wide statistics.
    pub async fn stats(&self) -> DbResult<InventoryStats> {
        Ok(inventory_stats(&self.full_listing().await?))
    }

    /// Statistics of one item.
    pub async fn item_stats(&self, id: i64) -> DbResult<Option<ItemStats>> {
        Ok(self.item_with_sales(id).await?.as_ref().map(ItemStats::from))
    }

    /// Export rows for every item.
    pub async fn export(&self) -> DbResult<Vec<ExportRow>> {
        Ok(export_rows(&self.full_listing().await?))
    }

    /// Unit price to pre-fill a sell form with.
    pub async fn suggested_price(&self, item_id: i64) -> DbResult<f64> {
        let sales = self.sales_history(item_id).await?;
        Ok(suggested_unit_price(&sales))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates an item from a form.
    pub async fn create_item(&self, form: &ItemForm) -> DbResult<Item> {
        let draft = validate_item_form(form)?;
        let item = self.db.items().insert(&draft).await?;

        info!(id = item.id, name = %item.name, cost_uah = item.cost_uah, "Item created");
        self.cache.invalidate(ItemChange::Created(item.id)).await;
        Ok(item)
    }

    /// Replaces an item's fields; `cost_uah` is recomputed from the form.
    pub async fn update_item(&self, id: i64, form: &ItemForm) -> DbResult<Item> {
        let draft = validate_item_form(form)?;
        let item = self.db.items().update(id, &draft).await?;

        info!(id, "Item updated");
        self.cache.invalidate(ItemChange::Updated(id)).await;
        Ok(item)
    }

    /// Deletes an item and all of its sales.
    pub async fn delete_item(&self, id: i64) -> DbResult<()> {
        let sales_removed = self.db.items().delete_with_sales(id).await?;

        info!(id, sales_removed, "Item deleted");
        self.cache.invalidate(ItemChange::Deleted(id)).await;
        Ok(())
    }

    /// Records a sale against an item.
    pub async fn sell(&self, item_id: i64, form: &SaleForm) -> DbResult<Sale> {
        let sale = self.db.sales().record(item_id, form).await?;

        info!(
            item_id,
            sale_id = sale.id,
            quantity = sale.quantity_sold,
            price = sale.price_per_unit_uah,
            "Sale recorded"
        );
        self.cache.invalidate(ItemChange::SalesChanged(item_id)).await;
        Ok(sale)
    }

    /// Edits a sale's quantity and unit price.
    pub async fn update_sale(&self, sale_id: i64, form: &SaleForm) -> DbResult<Sale> {
        let sale = self.db.sales().update(sale_id, form).await?;

        info!(sale_id, item_id = sale.item_id, "Sale updated");
        self.cache
            .invalidate(ItemChange::SalesChanged(sale.item_id))
            .await;
        Ok(sale)
    }

    /// Deletes a single sale.
    pub async fn delete_sale(&self, sale_id: i64) -> DbResult<()> {
        let sale = self.db.sales().delete(sale_id).await?;

        info!(sale_id, item_id = sale.item_id, "Sale deleted");
        self.cache
            .invalidate(ItemChange::SalesChanged(sale.item_id))
            .await;
        Ok(())
    }
}

/// Denormalizes sales into their items, preserving both orders.
fn attach_sales(items: Vec<Item>, sales: Vec<Sale>) -> Vec<ItemWithSales> {
    let mut by_item: HashMap<i64, Vec<Sale>> = HashMap::new();
    for sale in sales {
        by_item.entry(sale.item_id).or_default().push(sale);
    }

    items
        .into_iter()
        .map(|item| {
            let sales = by_item.remove(&item.id).unwrap_or_default();
            ItemWithSales::new(item, sales)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use oblik_core::{CoreError, ItemOverview, StockFilter, ValidationError};

    async fn setup() -> Inventory {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Inventory::new(db, Duration::from_secs(60))
    }

    fn form(name: &str, initial_quantity: i64) -> ItemForm {
        ItemForm {
            name: name.to_string(),
            initial_quantity,
            origin_country: Some("USA".to_string()),
            cost_original: Some(100.0),
            shipping_original: Some(20.0),
            customs_uah: Some(60.0),
            ..Default::default()
        }
    }

    fn sale(quantity_sold: i64, price_per_unit_uah: f64) -> SaleForm {
        SaleForm {
            quantity_sold,
            price_per_unit_uah,
        }
    }

    fn all(limit: u32) -> ItemQuery {
        ItemQuery {
            skip: 0,
            limit,
            search: None,
            filter: StockFilter::All,
        }
    }

    #[tokio::test]
    async fn test_create_computes_cost() {
        let inventory = setup().await;
        let item = inventory.create_item(&form("Jacket", 4)).await.unwrap();

        // (100 + 20) × 42.0 default USD rate
        assert_eq!(item.cost_uah, 5040.0);
        assert_eq!(item.rate, Some(42.0));
        assert_eq!(item.original_currency.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_form_without_write() {
        let inventory = setup().await;
        let err = inventory.create_item(&form("   ", 4)).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(inventory.full_listing().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sell_refreshes_cached_reads() {
        let inventory = setup().await;
        let item = inventory.create_item(&form("Jacket", 5)).await.unwrap();

        let before = inventory.page(&all(20)).await.unwrap();
        assert!(before[0].sales_history.is_empty());
        assert!(inventory.sales_history(item.id).await.unwrap().is_empty());

        inventory.sell(item.id, &sale(5, 300.0)).await.unwrap();

        let after = inventory.page(&all(20)).await.unwrap();
        let overview = ItemOverview::from(&after[0]);
        assert_eq!(overview.remaining_quantity, 0);
        assert!(!overview.can_sell);
        assert_eq!(inventory.sales_history(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_export() {
        let inventory = setup().await;
        let a = inventory.create_item(&form("Jacket", 4)).await.unwrap();
        inventory.create_item(&form("Boots", 2)).await.unwrap();
        inventory.sell(a.id, &sale(2, 2000.0)).await.unwrap();

        let stats = inventory.stats().await.unwrap();
        assert_eq!(stats.item_count, 2);
        assert_eq!(stats.total_sold_units, 2);
        assert_eq!(stats.total_expenses, 2.0 * (5040.0 + 60.0));
        assert_eq!(stats.total_income, 4000.0);

        let per_item = inventory.item_stats(a.id).await.unwrap().unwrap();
        assert_eq!(per_item.unit_cost, 5100.0 / 4.0);
        assert_eq!(per_item.profit, Some(4000.0 - 2.0 * 1275.0));

        let rows = inventory.export().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].profit_loss_per_item, None);
    }

    #[tokio::test]
    async fn test_delete_item_invalidates_detail() {
        let inventory = setup().await;
        let item = inventory.create_item(&form("Jacket", 4)).await.unwrap();
        inventory.sell(item.id, &sale(1, 10.0)).await.unwrap();
        assert!(inventory.item(item.id).await.unwrap().is_some());

        inventory.delete_item(item.id).await.unwrap();

        assert!(inventory.item(item.id).await.unwrap().is_none());
        assert!(inventory.sales_history(item.id).await.unwrap_err().is_not_found());
        assert_eq!(inventory.stats().await.unwrap().item_count, 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_sale() {
        let inventory = setup().await;
        let item = inventory.create_item(&form("Jacket", 10)).await.unwrap();
        let first = inventory.sell(item.id, &sale(3, 100.0)).await.unwrap();
        inventory.sell(item.id, &sale(4, 150.0)).await.unwrap();
        assert_eq!(inventory.suggested_price(item.id).await.unwrap(), 150.0);

        assert!(inventory.update_sale(first.id, &sale(7, 100.0)).await.is_err());
        inventory.update_sale(first.id, &sale(6, 100.0)).await.unwrap();

        let stock = inventory.item_with_sales(item.id).await.unwrap().unwrap().stock();
        assert_eq!(stock.sold, 10);

        inventory.delete_sale(first.id).await.unwrap();
        let stock = inventory.item_with_sales(item.id).await.unwrap().unwrap().stock();
        assert_eq!(stock.sold, 4);
    }
}
