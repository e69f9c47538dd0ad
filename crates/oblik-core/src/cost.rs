//! # Cost Conversion
//!
//! Converts an original-currency purchase into UAH and knows the currency
//! profile of each supported origin country.
//!
//! ## When It Runs
//! ```text
//! ItemForm { cost_original, shipping_original, rate }
//!      │
//!      ▼
//! uah_cost(...)  ── once, at item create / update
//!      │
//!      ▼
//! items.cost_uah (stored, never recomputed on read)
//! ```
//!
//! The conversion is total: missing or non-finite inputs count as zero and a
//! non-positive rate yields zero, so a write never fails because of it.

use serde::Serialize;

// =============================================================================
// Conversion
// =============================================================================

/// UAH equivalent of `(cost_original + shipping_original) * rate`.
///
/// ## Arguments
/// * `cost_original` - Purchase price in the original currency
/// * `shipping_original` - Shipping cost in the original currency
/// * `rate` - UAH per unit of the original currency
///
/// ## Returns
/// `0.0` when `rate` is missing, not finite, or `<= 0`; otherwise the
/// converted sum with missing amounts treated as zero.
pub fn uah_cost(
    cost_original: Option<f64>,
    shipping_original: Option<f64>,
    rate: Option<f64>,
) -> f64 {
    let rate = finite_or_zero(rate);
    if rate <= 0.0 {
        return 0.0;
    }

    (finite_or_zero(cost_original) + finite_or_zero(shipping_original)) * rate
}

#[inline]
fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

// =============================================================================
// Currency Profiles
// =============================================================================

/// Currency used for purchases from one origin country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrencyProfile {
    pub country: &'static str,
    pub code: &'static str,
    pub symbol: &'static str,
    /// Suggested UAH rate when the form leaves it blank.
    pub default_rate: f64,
}

/// Origin countries the application knows about.
pub const CURRENCY_PROFILES: [CurrencyProfile; 3] = [
    CurrencyProfile {
        country: "USA",
        code: "USD",
        symbol: "$",
        default_rate: 42.0,
    },
    CurrencyProfile {
        country: "Poland",
        code: "PLN",
        symbol: "zł",
        default_rate: 11.11,
    },
    CurrencyProfile {
        country: "England",
        code: "GBP",
        symbol: "£",
        default_rate: 55.0,
    },
];

/// Looks up a profile by country name, ignoring case and surrounding spaces.
pub fn currency_profile(country: &str) -> Option<&'static CurrencyProfile> {
    let country = country.trim();
    CURRENCY_PROFILES
        .iter()
        .find(|p| p.country.eq_ignore_ascii_case(country))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_rate_is_zero() {
        assert_eq!(uah_cost(Some(100.0), Some(20.0), Some(0.0)), 0.0);
        assert_eq!(uah_cost(Some(100.0), Some(20.0), Some(-3.5)), 0.0);
        assert_eq!(uah_cost(Some(100.0), Some(20.0), None), 0.0);
    }

    #[test]
    fn test_positive_rate_converts_sum() {
        assert_eq!(uah_cost(Some(100.0), Some(20.0), Some(42.0)), 5040.0);
        assert_eq!(uah_cost(Some(10.0), None, Some(2.5)), 25.0);
        assert_eq!(uah_cost(None, Some(4.0), Some(2.5)), 10.0);
        assert_eq!(uah_cost(None, None, Some(2.5)), 0.0);
    }

    #[test]
    fn test_non_finite_inputs_are_zero() {
        assert_eq!(uah_cost(Some(f64::NAN), Some(4.0), Some(2.0)), 8.0);
        assert_eq!(uah_cost(Some(1.0), Some(1.0), Some(f64::INFINITY)), 0.0);
        assert_eq!(uah_cost(Some(1.0), Some(1.0), Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_currency_profile_lookup() {
        let pln = currency_profile("poland").unwrap();
        assert_eq!(pln.code, "PLN");
        assert_eq!(pln.default_rate, 11.11);

        assert_eq!(currency_profile(" USA ").unwrap().symbol, "$");
        assert!(currency_profile("Narnia").is_none());
    }
}
