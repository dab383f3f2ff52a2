//! Low-stock alert evaluation.
//!
//! Storage gathers one [`LowStockCandidate`] per product that sold in the
//! company's warehouses during the window; this module decides which of those
//! alert and how.

use serde::{Deserialize, Serialize};

use wareflow_core::{ProductId, SupplierId, WarehouseId};

use crate::entities::Supplier;

/// Stock of a candidate product in one of the company's warehouses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub quantity: i64,
}

/// Facts about a product with recent sales, scoped to one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockCandidate {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub threshold: i64,
    pub stock: Vec<WarehouseStock>,
    /// Units sold across the company's warehouses inside the window.
    pub units_sold: i64,
    /// Primary supplier (lowest id), if any.
    pub supplier: Option<Supplier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSupplier {
    pub id: Option<SupplierId>,
    pub name: String,
    pub contact_email: String,
}

impl AlertSupplier {
    fn unknown() -> Self {
        Self {
            id: None,
            name: "N/A".to_string(),
            contact_email: "N/A".to_string(),
        }
    }
}

impl From<Supplier> for AlertSupplier {
    fn from(s: Supplier) -> Self {
        Self {
            id: Some(s.id),
            name: s.name,
            contact_email: s.contact_email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub current_stock: i64,
    pub threshold: i64,
    pub days_until_stockout: i64,
    pub supplier: AlertSupplier,
}

/// Turn candidates into alerts, ordered by product id.
///
/// A candidate alerts when its total company stock is below its threshold and
/// it still has a warehouse with positive stock; the alert names the warehouse
/// holding the least positive stock.
pub fn evaluate_low_stock(candidates: Vec<LowStockCandidate>, window_days: u32) -> Vec<LowStockAlert> {
    let mut alerts: Vec<LowStockAlert> = candidates
        .into_iter()
        .filter_map(|c| evaluate_one(c, window_days))
        .collect();
    alerts.sort_by_key(|a| a.product_id);
    alerts
}

fn evaluate_one(candidate: LowStockCandidate, window_days: u32) -> Option<LowStockAlert> {
    let total: i64 = candidate.stock.iter().map(|s| s.quantity).sum();
    if total >= candidate.threshold {
        return None;
    }

    // Ties resolve to the lowest warehouse id.
    let lowest = candidate
        .stock
        .iter()
        .filter(|s| s.quantity > 0)
        .min_by_key(|s| (s.quantity, s.warehouse_id))?;

    Some(LowStockAlert {
        product_id: candidate.product_id,
        product_name: candidate.product_name,
        sku: candidate.sku,
        warehouse_id: lowest.warehouse_id,
        warehouse_name: lowest.warehouse_name.clone(),
        current_stock: lowest.quantity,
        threshold: candidate.threshold,
        days_until_stockout: days_until_stockout(total, candidate.units_sold, window_days),
        supplier: candidate
            .supplier
            .map(AlertSupplier::from)
            .unwrap_or_else(AlertSupplier::unknown),
    })
}

/// `floor(stock / average daily sales)`, or 0 without sales.
pub fn days_until_stockout(total_stock: i64, units_sold: i64, window_days: u32) -> i64 {
    if units_sold <= 0 || window_days == 0 {
        return 0;
    }
    let avg_daily = units_sold as f64 / f64::from(window_days);
    (total_stock as f64 / avg_daily).floor() as i64
}
