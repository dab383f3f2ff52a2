//! Onboarding a new SKU into a warehouse: request shape and validation.
//!
//! Validation here is pure. Checks that need storage (warehouse existence, sku
//! uniqueness) are done by the infra layer, which treats the storage
//! constraints as the source of truth.

use serde::{Deserialize, Serialize};

use wareflow_core::{DomainError, DomainResult, WarehouseId};

use crate::values::{Price, Quantity, Sku};

/// Wire-level request to create a product together with its initial stock.
///
/// Every field is optional at the serde level so a missing field surfaces as a
/// validation error naming the field instead of a deserializer message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub warehouse_id: Option<i64>,
    pub initial_quantity: Option<i64>,
    pub is_bundle: Option<bool>,
    pub low_stock_threshold: Option<i64>,
}

/// A validated product, not yet persisted (no identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub sku: Sku,
    pub name: String,
    pub price: Price,
    pub is_bundle: bool,
    pub low_stock_threshold: Quantity,
}

/// Validated onboarding unit of work: one product plus its first inventory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingPlan {
    pub product: ProductDraft,
    pub warehouse_id: WarehouseId,
    pub initial_quantity: Quantity,
}

fn required<T>(value: Option<T>, field: &str) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

impl CreateProductRequest {
    /// Validate every field. Returns the first failure.
    pub fn validate(&self) -> DomainResult<OnboardingPlan> {
        let name = required(self.name.as_deref(), "name")?.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let sku = Sku::parse(required(self.sku.as_deref(), "sku")?)?;
        let price = Price::from_decimal(required(self.price, "price")?)?;
        let warehouse_id = WarehouseId::new(required(self.warehouse_id, "warehouse_id")?);

        let initial_quantity = Quantity::new(required(self.initial_quantity, "initial_quantity")?)
            .map_err(|_| DomainError::validation("initial_quantity cannot be negative"))?;

        let low_stock_threshold = Quantity::new(self.low_stock_threshold.unwrap_or(0))
            .map_err(|_| DomainError::validation("low_stock_threshold cannot be negative"))?;

        Ok(OnboardingPlan {
            product: ProductDraft {
                sku,
                name: name.to_string(),
                price,
                is_bundle: self.is_bundle.unwrap_or(false),
                low_stock_threshold,
            },
            warehouse_id,
            initial_quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> CreateProductRequest {
        CreateProductRequest {
            name: Some("Widget".to_string()),
            sku: Some("W-100".to_string()),
            price: Some(9.99),
            warehouse_id: Some(1),
            initial_quantity: Some(50),
            is_bundle: None,
            low_stock_threshold: None,
        }
    }

    fn expect_validation(req: CreateProductRequest, needle: &str) {
        match req.validate() {
            Err(DomainError::Validation(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}")
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_produces_plan() {
        let plan = widget().validate().unwrap();
        assert_eq!(plan.product.sku.as_str(), "W-100");
        assert_eq!(plan.product.name, "Widget");
        assert_eq!(plan.product.price.minor_units(), 999);
        assert!(!plan.product.is_bundle);
        assert_eq!(plan.product.low_stock_threshold, Quantity::ZERO);
        assert_eq!(plan.warehouse_id, WarehouseId::new(1));
        assert_eq!(plan.initial_quantity.get(), 50);
    }

    #[test]
    fn name_is_trimmed_and_required() {
        let mut req = widget();
        req.name = Some("  Widget  ".to_string());
        assert_eq!(req.validate().unwrap().product.name, "Widget");

        req.name = Some("   ".to_string());
        expect_validation(req.clone(), "name");

        req.name = None;
        expect_validation(req, "name is required");
    }

    #[test]
    fn every_core_field_is_required() {
        let mut req = widget();
        req.sku = None;
        expect_validation(req, "sku is required");

        let mut req = widget();
        req.price = None;
        expect_validation(req, "price is required");

        let mut req = widget();
        req.warehouse_id = None;
        expect_validation(req, "warehouse_id is required");

        let mut req = widget();
        req.initial_quantity = None;
        expect_validation(req, "initial_quantity is required");
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let mut req = widget();
        req.price = Some(-1.0);
        expect_validation(req, "price");

        let mut req = widget();
        req.initial_quantity = Some(-5);
        expect_validation(req, "initial_quantity");

        let mut req = widget();
        req.low_stock_threshold = Some(-1);
        expect_validation(req, "low_stock_threshold");
    }

    #[test]
    fn zero_initial_quantity_is_allowed() {
        let mut req = widget();
        req.initial_quantity = Some(0);
        assert_eq!(req.validate().unwrap().initial_quantity, Quantity::ZERO);
    }

    #[test]
    fn deserializes_wire_shape_with_optional_extras() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name":"Kit","sku":"K-1","price":20,"warehouse_id":1,"initial_quantity":3,"is_bundle":true}"#,
        )
        .unwrap();
        let plan = req.validate().unwrap();
        assert!(plan.product.is_bundle);
        assert_eq!(plan.product.price.minor_units(), 2000);
    }
}
