//! Value objects: SKU, price and stock quantity.
//!
//! Constructors are the validation boundary: storage backends rebuild these
//! from rows through the same constructors, so a corrupt row surfaces as an
//! error instead of an invalid value.

use serde::{Deserialize, Serialize};

use wareflow_core::{DomainError, DomainResult, ValueObject};

/// Longest SKU accepted at onboarding.
pub const MAX_SKU_LEN: usize = 64;

/// Largest price accepted, in minor units (one billion currency units).
const MAX_PRICE_MINOR: i64 = 100_000_000_000;

/// Stock keeping unit: the business key of a product, unique across products.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if trimmed.chars().count() > MAX_SKU_LEN {
            return Err(DomainError::validation(format!(
                "sku cannot exceed {MAX_SKU_LEN} characters"
            )));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("sku cannot contain whitespace"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Sku {}

/// Non-negative price in minor currency units (cents).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub fn from_minor_units(minor: i64) -> DomainResult<Self> {
        if minor < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if minor > MAX_PRICE_MINOR {
            return Err(DomainError::validation("price is too large"));
        }
        Ok(Self(minor))
    }

    /// Parse a decimal amount as received on the wire (e.g. `9.99`).
    ///
    /// Accepts at most two fractional digits; `9.999` is rejected rather than
    /// silently rounded.
    pub fn from_decimal(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let scaled = amount * 100.0;
        let minor = scaled.round();
        let tolerance = 1e-6_f64.max(scaled * f64::EPSILON * 4.0);
        if (scaled - minor).abs() > tolerance {
            return Err(DomainError::validation(
                "price cannot have more than two decimal places",
            ));
        }
        if minor > MAX_PRICE_MINOR as f64 {
            return Err(DomainError::validation("price is too large"));
        }
        Self::from_minor_units(minor as i64)
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl ValueObject for Price {}

/// Non-negative stock quantity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_is_trimmed() {
        let sku = Sku::parse("  W-100 ").unwrap();
        assert_eq!(sku.as_str(), "W-100");
        assert_eq!(sku, Sku::parse("W-100").unwrap());
    }

    #[test]
    fn sku_rejects_blank_and_inner_whitespace() {
        assert!(matches!(Sku::parse("   "), Err(DomainError::Validation(_))));
        assert!(matches!(Sku::parse("W 100"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn sku_rejects_overlong_values() {
        let long = "X".repeat(MAX_SKU_LEN + 1);
        assert!(Sku::parse(&long).is_err());
        assert!(Sku::parse(&"X".repeat(MAX_SKU_LEN)).is_ok());
    }

    #[test]
    fn price_parses_two_decimal_amounts() {
        assert_eq!(Price::from_decimal(9.99).unwrap().minor_units(), 999);
        assert_eq!(Price::from_decimal(0.0).unwrap().minor_units(), 0);
        assert_eq!(Price::from_decimal(1234.5).unwrap().minor_units(), 123_450);
    }

    #[test]
    fn price_rejects_negative_non_finite_and_sub_cent() {
        assert!(Price::from_decimal(-0.01).is_err());
        assert!(Price::from_decimal(f64::NAN).is_err());
        assert!(Price::from_decimal(f64::INFINITY).is_err());
        assert!(Price::from_decimal(9.999).is_err());
    }

    #[test]
    fn quantity_cannot_be_negative() {
        assert!(Quantity::new(-1).is_err());
        assert_eq!(Quantity::new(50).unwrap().get(), 50);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any whole number of cents survives the decimal parse unchanged.
            #[test]
            fn cents_round_trip_through_decimal(minor in 0i64..100_000_000_000) {
                let price = Price::from_minor_units(minor).unwrap();
                prop_assert_eq!(Price::from_decimal(price.as_decimal()).unwrap(), price);
            }

            #[test]
            fn negative_quantities_always_rejected(value in i64::MIN..0) {
                prop_assert!(Quantity::new(value).is_err());
            }
        }
    }
}
