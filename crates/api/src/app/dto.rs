use std::str::FromStr;

use axum::http::StatusCode;
use serde::Deserialize;

use wareflow_catalog::{BundleComponent, InventoryRecord, Product};
use wareflow_core::DomainError;
use wareflow_infra::{ErrorKind, ProductDetails};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/products/{id}/components`.
#[derive(Debug, Deserialize)]
pub struct AddComponentRequest {
    pub component_id: Option<i64>,
    pub quantity: Option<i64>,
}

/// Query string of the low-stock report.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    /// Reference date (`YYYY-MM-DD`); defaults to today (UTC).
    pub as_of: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn inventory_to_json(record: &InventoryRecord) -> serde_json::Value {
    serde_json::json!({
        "warehouse_id": record.warehouse_id,
        "quantity": record.quantity.get(),
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id,
        "sku": product.sku.as_str(),
        "name": product.name,
        "price": product.price.as_decimal(),
        "is_bundle": product.is_bundle,
        "low_stock_threshold": product.low_stock_threshold.get(),
    })
}

pub fn product_details_to_json(details: &ProductDetails) -> serde_json::Value {
    let mut json = product_to_json(&details.product);
    json["inventory"] = details.inventory.iter().map(inventory_to_json).collect();
    json
}

pub fn component_to_json(edge: &BundleComponent) -> serde_json::Value {
    serde_json::json!({
        "bundle_id": edge.bundle_id,
        "component_id": edge.component_id,
        "quantity": edge.quantity,
    })
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, ErrorKind::Validation.as_str(), e.to_string())
    })
}
