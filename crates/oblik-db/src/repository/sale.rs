//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Checked Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record(item_id, form)                update(sale_id, form)            │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  validate_sale_form (no store call)   validate_sale_form               │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  BEGIN ─ load item + its sales        BEGIN ─ load sale, item, sales   │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  check_sell                           check_sale_edit                  │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  INSERT ─ COMMIT                      UPDATE ─ COMMIT                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected check drops the transaction without writing anything.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::item::fetch_item;
use oblik_core::validation::{check_sale_edit, check_sell, validate_sale_form};
use oblik_core::{Sale, SaleForm};

const SALE_COLUMNS: &str = "id, item_id, quantity_sold, price_per_unit_uah, sale_timestamp";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut *conn, id).await
    }

    /// Lists an item's sales, oldest first.
    pub async fn list_for_item(&self, item_id: i64) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sales(&mut *conn, item_id).await
    }

    /// Lists the sales of several items in one query, oldest first.
    pub async fn list_for_items(&self, item_ids: &[i64]) -> DbResult<Vec<Sale>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE item_id IN ("
        ));
        let mut ids = builder.separated(", ");
        for id in item_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY sale_timestamp, id");

        let sales = builder
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Lists every sale, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_timestamp, id");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    /// Records a sale against an item, stamped with the current time.
    ///
    /// ## Errors
    /// * `DbError::Rejected` - Bad quantity/price, or not enough stock left
    /// * `DbError::NotFound` - No such item
    pub async fn record(&self, item_id: i64, form: &SaleForm) -> DbResult<Sale> {
        validate_sale_form(form)?;
        debug!(item_id, quantity = form.quantity_sold, "Recording sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let item = fetch_item(&mut *tx, item_id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", item_id))?;
        let sales = fetch_sales(&mut *tx, item_id).await?;
        let after = check_sell(&item, &sales, form)?;

        let sql = format!(
            r#"
            INSERT INTO sales (item_id, quantity_sold, price_per_unit_uah, sale_timestamp)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {SALE_COLUMNS}
            "#
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(item_id)
            .bind(form.quantity_sold)
            .bind(form.price_per_unit_uah)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(sale_id = sale.id, remaining = after.remaining, "Sale recorded");
        Ok(sale)
    }

    /// Replaces a sale's quantity and unit price.
    ///
    /// The sale keeps its item and timestamp. Its new quantity must fit into
    /// `initial_quantity − Σ(other sales of the item)`.
    pub async fn update(&self, sale_id: i64, form: &SaleForm) -> DbResult<Sale> {
        validate_sale_form(form)?;
        debug!(sale_id, quantity = form.quantity_sold, "Updating sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let existing = fetch_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        let item = fetch_item(&mut *tx, existing.item_id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", existing.item_id))?;
        let sales = fetch_sales(&mut *tx, item.id).await?;
        check_sale_edit(&item, &sales, sale_id, form)?;

        let sql = format!(
            r#"
            UPDATE sales SET quantity_sold = ?2, price_per_unit_uah = ?3
            WHERE id = ?1
            RETURNING {SALE_COLUMNS}
            "#
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .bind(form.quantity_sold)
            .bind(form.price_per_unit_uah)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale)
    }

    /// Deletes a single sale.
    ///
    /// ## Returns
    /// The deleted sale, so callers know which item it belonged to.
    pub async fn delete(&self, sale_id: i64) -> DbResult<Sale> {
        debug!(sale_id, "Deleting sale");

        let sql = format!("DELETE FROM sales WHERE id = ?1 RETURNING {SALE_COLUMNS}");
        sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }
}

/// Loads one sale on an existing connection or transaction.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(sale)
}

/// Loads an item's sales, oldest first, on an existing connection or transaction.
pub(crate) async fn fetch_sales(conn: &mut SqliteConnection, item_id: i64) -> DbResult<Vec<Sale>> {
    let sql = format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE item_id = ?1 ORDER BY sale_timestamp, id"
    );
    let sales = sqlx::query_as::<_, Sale>(&sql)
        .bind(item_id)
        .fetch_all(conn)
        .await?;
    Ok(sales)
}

// =============================================================================
// Unit Tests
// =============================================================================
