//! # Item Repository
//!
//! Database operations for items.
//!
//! ## Listing Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items ──LEFT JOIN── (SELECT item_id, SUM(quantity_sold) FROM sales)    │
//! │    │                                                                    │
//! │    ├── name_search LIKE '%term%'        (search, lowercased)            │
//! │    ├── status: all | in_stock | sold    (on the summed quantity)        │
//! │    ├── ORDER BY id                                                      │
//! │    └── LIMIT / OFFSET                   (applied last)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Filtering happens before pagination, so a page never under-reports the
//! items that match.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::sale::fetch_sales;
use oblik_core::validation::check_initial_quantity;
use oblik_core::{Item, ItemDraft, ItemQuery};

const ITEM_COLUMNS: &str = "id, name, initial_quantity, cost_uah, customs_uah, description, \
     origin_country, original_currency, cost_original, shipping_original, rate, created_at";

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists one page of items matching the query, ordered by id.
    ///
    /// ## Arguments
    /// * `query` - Offset, page size, optional search term and stock filter
    pub async fn list_page(&self, query: &ItemQuery) -> DbResult<Vec<Item>> {
        debug!(
            skip = query.skip,
            limit = query.limit,
            search = ?query.search,
            filter = %query.filter,
            "Listing items"
        );

        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            LEFT JOIN (
                SELECT item_id, SUM(quantity_sold) AS sold
                FROM sales
                GROUP BY item_id
            ) totals ON totals.item_id = items.id
            WHERE (?1 IS NULL OR name_search LIKE ?1 ESCAPE '\')
              AND (
                    ?2 = 'all'
                 OR (?2 = 'in_stock' AND initial_quantity - COALESCE(totals.sold, 0) > 0)
                 OR (?2 = 'sold' AND COALESCE(totals.sold, 0) > 0)
              )
            ORDER BY id
            LIMIT ?3 OFFSET ?4
            "#
        );

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(query.search.as_deref().map(like_pattern))
            .bind(query.filter.as_str())
            .bind(i64::from(query.limit))
            .bind(i64::from(query.skip))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = items.len(), "Listing returned items");
        Ok(items)
    }

    /// Lists every item, ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id");
        let items = sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut *conn, id).await
    }

    /// Inserts a validated item.
    ///
    /// ## Returns
    /// The stored item with its assigned id and creation timestamp.
    pub async fn insert(&self, draft: &ItemDraft) -> DbResult<Item> {
        debug!(name = %draft.name, "Inserting item");

        let sql = format!(
            r#"
            INSERT INTO items (
                name, name_search, initial_quantity, cost_uah, customs_uah, description,
                origin_country, original_currency, cost_original, shipping_original, rate,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(&draft.name)
            .bind(draft.name.to_lowercase())
            .bind(draft.initial_quantity)
            .bind(draft.cost_uah)
            .bind(draft.customs_uah)
            .bind(&draft.description)
            .bind(&draft.origin_country)
            .bind(&draft.original_currency)
            .bind(draft.cost_original)
            .bind(draft.shipping_original)
            .bind(draft.rate)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        debug!(id = item.id, "Item inserted");
        Ok(item)
    }

    /// Replaces every editable field of an item.
    ///
    /// The new `initial_quantity` is checked against the units already sold
    /// on the same transaction as the write.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - No such item
    /// * `DbError::Rejected(QuantityBelowSold)` - Would drop below sold units
    pub async fn update(&self, id: i64, draft: &ItemDraft) -> DbResult<Item> {
        debug!(id, "Updating item");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if fetch_item(&mut *tx, id).await?.is_none() {
            return Err(DbError::not_found("Item", id));
        }
        let sales = fetch_sales(&mut *tx, id).await?;
        check_initial_quantity(id, &sales, draft.initial_quantity)?;

        let sql = format!(
            r#"
            UPDATE items SET
                name = ?2,
                name_search = ?3,
                initial_quantity = ?4,
                cost_uah = ?5,
                customs_uah = ?6,
                description = ?7,
                origin_country = ?8,
                original_currency = ?9,
                cost_original = ?10,
                shipping_original = ?11,
                rate = ?12
            WHERE id = ?1
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(&draft.name)
            .bind(draft.name.to_lowercase())
            .bind(draft.initial_quantity)
            .bind(draft.cost_uah)
            .bind(draft.customs_uah)
            .bind(&draft.description)
            .bind(&draft.origin_country)
            .bind(&draft.original_currency)
            .bind(draft.cost_original)
            .bind(draft.shipping_original)
            .bind(draft.rate)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(item)
    }

    /// Deletes an item together with all of its sales.
    ///
    /// ## Returns
    /// Number of sales removed along with the item.
    pub async fn delete_with_sales(&self, id: i64) -> DbResult<u64> {
        debug!(id, "Deleting item with its sales");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sales_removed = sqlx::query("DELETE FROM sales WHERE item_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the sales delete (there were none anyway)
            return Err(DbError::not_found("Item", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id, sales_removed, "Item deleted");
        Ok(sales_removed)
    }
}

/// Loads one item on an existing connection or transaction.
pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Item>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
    let item = sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// `%term%` over the lowercased term, with LIKE wildcards escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Unit Tests
// =============================================================================
