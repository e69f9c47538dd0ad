//! # Error Types
//!
//! Domain-specific error types for oblik-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  oblik-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  oblik-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  oblik-api errors (in app)                                             │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is a rejection made before any store write happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Sale cannot be found (or does not belong to the item named).
    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    /// Selling (or editing a sale to) more units than the item has left.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell (qty: 6)
    ///      │
    ///      ▼
    /// Check stock: initial=5, sold=0 → available=5
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: 7, available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Client shows: "Only 5 left"
    /// ```
    #[error("Insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: i64,
        available: i64,
        requested: i64,
    },

    /// Item update would set the initial quantity below what is already sold.
    #[error("Initial quantity {requested} for item {item_id} is below the {sold} units already sold")]
    QuantityBelowSold {
        item_id: i64,
        sold: i64,
        requested: i64,
    },

    /// The view cannot take this action from its current state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Integer value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotANumber { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }

    pub(crate) fn non_negative(field: &str) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }
    }

    pub(crate) fn not_a_number(field: &str) -> Self {
        ValidationError::NotANumber {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: 7,
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for item 7: available 5, requested 6"
        );

        let err = CoreError::QuantityBelowSold {
            item_id: 3,
            sold: 4,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Initial quantity 2 for item 3 is below the 4 units already sold"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::non_negative("price_per_unit_uah").to_string(),
            "price_per_unit_uah must not be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::positive("rate").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
