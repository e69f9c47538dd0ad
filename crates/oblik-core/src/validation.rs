//! # Validation Module
//!
//! Input validation and stock rules for Oblik.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request decoding (serde)                                     │
//! │  └── Types and required JSON fields                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Field rules (THIS MODULE)                                    │
//! │  ├── validate_item_form  → ItemDraft with cost_uah computed            │
//! │  └── validate_sale_form  → quantity > 0, price >= 0                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Stock rules (THIS MODULE, inside the write transaction)      │
//! │  ├── check_sell                (qty <= remaining)                      │
//! │  ├── check_sale_edit           (qty <= initial - other sales)          │
//! │  └── check_initial_quantity    (initial >= already sold)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rejection here happens before a write, and the rules are pure:
//! repeating a rejected request yields the same error and changes nothing.
//!
//! ## Usage
//! ```rust
//! use oblik_core::validation::{validate_item_name, validate_quantity};
//!
//! assert_eq!(validate_item_name("  Lamp ").unwrap(), "Lamp");
//! assert!(validate_quantity("quantity_sold", 0).is_err());
//! ```

use crate::aggregation::{sales_summary, StockLevel};
use crate::cost::{currency_profile, uah_cost};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Item, ItemDraft, ItemForm, Sale, SaleForm};
use crate::{MAX_NAME_LEN, MAX_PAGE_SIZE, MAX_SEARCH_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name.
///
/// ## Returns
/// The trimmed name.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a name search term.
///
/// ## Returns
/// `None` for a blank term (no filtering), else the trimmed term.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a strictly positive unit count.
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::positive(field));
    }
    Ok(())
}

/// Validates a UAH unit price. Zero is allowed.
pub fn validate_unit_price(price: f64) -> ValidationResult<()> {
    validate_amount("price_per_unit_uah", price)
}

/// Validates a finite, non-negative money amount.
pub fn validate_amount(field: &str, amount: f64) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::not_a_number(field));
    }
    if amount < 0.0 {
        return Err(ValidationError::non_negative(field));
    }
    Ok(())
}

/// Validates a conversion rate: finite and strictly positive.
pub fn validate_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() {
        return Err(ValidationError::not_a_number("rate"));
    }
    if rate <= 0.0 {
        return Err(ValidationError::positive("rate"));
    }
    Ok(())
}

/// Validates a listing page size.
pub fn validate_page_size(limit: u32) -> ValidationResult<u32> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }
    Ok(limit)
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates an item create/update form and computes its UAH cost.
///
/// ## Rules
/// - `name` required, at most 200 characters
/// - `initial_quantity >= 1`
/// - `rate > 0`; when omitted, the origin country's default rate is used
/// - `cost_original`, `shipping_original`, `customs_uah` `>= 0` when present
///
/// The currency code also falls back to the origin country's profile.
pub fn validate_item_form(form: &ItemForm) -> ValidationResult<ItemDraft> {
    let name = validate_item_name(&form.name)?;
    validate_quantity("initial_quantity", form.initial_quantity)?;

    let origin_country = optional_text(form.origin_country.as_deref());
    let profile = origin_country.as_deref().and_then(currency_profile);

    let rate = form
        .rate
        .or_else(|| profile.map(|p| p.default_rate))
        .ok_or_else(|| ValidationError::required("rate"))?;
    validate_rate(rate)?;

    for (field, amount) in [
        ("cost_original", form.cost_original),
        ("shipping_original", form.shipping_original),
        ("customs_uah", form.customs_uah),
    ] {
        if let Some(amount) = amount {
            validate_amount(field, amount)?;
        }
    }

    let original_currency = optional_text(form.original_currency.as_deref())
        .or_else(|| profile.map(|p| p.code.to_string()));

    Ok(ItemDraft {
        name,
        initial_quantity: form.initial_quantity,
        cost_uah: uah_cost(form.cost_original, form.shipping_original, Some(rate)),
        customs_uah: form.customs_uah.unwrap_or(0.0),
        description: optional_text(form.description.as_deref()),
        origin_country,
        original_currency,
        cost_original: form.cost_original,
        shipping_original: form.shipping_original,
        rate: Some(rate),
    })
}

/// Validates the field-level rules of a sell / edit-sale form.
pub fn validate_sale_form(form: &SaleForm) -> ValidationResult<()> {
    validate_quantity("quantity_sold", form.quantity_sold)?;
    validate_unit_price(form.price_per_unit_uah)
}

// =============================================================================
// Stock Rules
// =============================================================================

/// Checks that a new sale fits into the item's remaining stock.
///
/// ## Arguments
/// * `item` - The item being sold
/// * `sales` - Every existing sale of the item
/// * `form` - Requested quantity and unit price
///
/// ## Returns
/// The stock level the item will have once the sale is recorded.
///
/// ## User Workflow
/// ```text
/// initial 5, no sales
///      │
///      ├── sell 6 → InsufficientStock { available: 5, requested: 6 }
///      │
///      └── sell 5 → Ok(StockLevel { remaining: 0 }) → can_sell == false
/// ```
pub fn check_sell(item: &Item, sales: &[Sale], form: &SaleForm) -> CoreResult<StockLevel> {
    validate_sale_form(form)?;

    let stock = StockLevel::new(item.initial_quantity, sales_summary(sales).total_quantity);
    if form.quantity_sold > stock.remaining {
        return Err(CoreError::InsufficientStock {
            item_id: item.id,
            available: stock.remaining.max(0),
            requested: form.quantity_sold,
        });
    }

    Ok(StockLevel::new(
        item.initial_quantity,
        stock.sold + form.quantity_sold,
    ))
}

/// Checks an edit of an existing sale.
///
/// The edited sale is excluded from the sold total before the new quantity
/// is compared with `initial_quantity − Σ(other sales)`.
pub fn check_sale_edit(
    item: &Item,
    sales: &[Sale],
    sale_id: i64,
    form: &SaleForm,
) -> CoreResult<StockLevel> {
    if !sales.iter().any(|s| s.id == sale_id && s.item_id == item.id) {
        return Err(CoreError::SaleNotFound(sale_id));
    }

    validate_sale_form(form)?;

    let others: Vec<&Sale> = sales.iter().filter(|s| s.id != sale_id).collect();
    let sold_elsewhere = sales_summary(others).total_quantity;
    let available = item.initial_quantity - sold_elsewhere;

    if form.quantity_sold > available {
        return Err(CoreError::InsufficientStock {
            item_id: item.id,
            available: available.max(0),
            requested: form.quantity_sold,
        });
    }

    Ok(StockLevel::new(
        item.initial_quantity,
        sold_elsewhere + form.quantity_sold,
    ))
}

/// Checks that an item update keeps `initial_quantity` at or above the
/// units already sold.
pub fn check_initial_quantity(item_id: i64, sales: &[Sale], initial_quantity: i64) -> CoreResult<()> {
    let sold = sales_summary(sales).total_quantity;
    if initial_quantity < sold {
        return Err(CoreError::QuantityBelowSold {
            item_id,
            sold,
            requested: initial_quantity,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
