//! Catalog storage boundary.
//!
//! This module defines the infrastructure-facing abstraction the services
//! write into. The schema is owned by the backend; the trait only states the
//! operations and the guarantees each one gives.

pub mod fail_point;
pub mod in_memory;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use wareflow_catalog::{
    BundleComponent, Company, InventoryRecord, LowStockCandidate, OnboardingPlan, Product, Quantity,
    Sale, Sku, Supplier, Warehouse,
};
use wareflow_core::{CompanyId, DomainError, ProductId, SupplierId, WarehouseId};

pub use fail_point::{FailPoint, FailPoints};
pub use in_memory::InMemoryCatalogStore;
pub use sqlite::SqliteCatalogStore;

/// Storage operation error.
///
/// These are **infrastructure errors**. Constraint violations are reported
/// as such; the services decide what they mean for the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A domain rule evaluated inside a transaction rejected the write.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("injected failure at {0:?}")]
    FailPoint(FailPoint),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Row totals, used to assert that failed operations persisted nothing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub products: u64,
    pub inventory: u64,
    pub bundle_edges: u64,
}

/// Catalog store.
///
/// ## Atomicity
///
/// Every write method is one unit of work: it either applies completely or
/// leaves no trace. In particular [`CatalogStore::create_product_with_stock`]
/// inserts the product and its first inventory row under a single commit, so
/// no reader can ever observe the product without its stock.
///
/// ## Uniqueness
///
/// `sku` uniqueness and the `(product, warehouse)` inventory key are enforced
/// by the backend itself and reported as [`StoreError::UniqueViolation`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError>;

    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError>;

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError>;

    async fn link_supplier(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<(), StoreError>;

    /// Stock an existing product into another warehouse (one new inventory row).
    async fn insert_inventory(&self, record: &InventoryRecord) -> Result<(), StoreError>;

    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError>;

    async fn company_exists(&self, id: CompanyId) -> Result<bool, StoreError>;

    async fn warehouse_exists(&self, id: WarehouseId) -> Result<bool, StoreError>;

    async fn find_product_by_sku(&self, sku: &Sku) -> Result<Option<ProductId>, StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn inventory_for_product(&self, id: ProductId) -> Result<Vec<InventoryRecord>, StoreError>;

    async fn stock_level(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<Quantity>, StoreError>;

    async fn row_counts(&self) -> Result<RowCounts, StoreError>;

    /// Insert the product and its initial inventory row atomically.
    async fn create_product_with_stock(&self, plan: &OnboardingPlan) -> Result<Product, StoreError>;

    /// Validate and insert a bundle edge in one transaction.
    ///
    /// Existence, the bundle flag and the acyclicity/depth checks are all
    /// evaluated against the state the insert commits into.
    async fn add_bundle_component(&self, edge: &BundleComponent, max_depth: usize) -> Result<(), StoreError>;

    async fn bundle_components(&self, bundle_id: ProductId) -> Result<Vec<BundleComponent>, StoreError>;

    /// Products sold in the company's warehouses on or after `since`, with
    /// their company-scoped stock, units sold and primary supplier.
    async fn low_stock_candidates(
        &self,
        company_id: CompanyId,
        since: NaiveDate,
    ) -> Result<Vec<LowStockCandidate>, StoreError>;
}

/// Shared pre-insert validation for bundle edges.
pub(crate) fn check_bundle_endpoints(
    edge: &BundleComponent,
    bundle: Option<&Product>,
    component_exists: bool,
) -> Result<(), StoreError> {
    let bundle = bundle.ok_or_else(|| DomainError::not_found(format!("product {}", edge.bundle_id)))?;
    if !bundle.is_bundle {
        return Err(DomainError::validation(format!("product {} is not a bundle", edge.bundle_id)).into());
    }
    if !component_exists {
        return Err(DomainError::not_found(format!("product {}", edge.component_id)).into());
    }
    if edge.quantity < 1 {
        return Err(DomainError::validation("component quantity must be at least 1").into());
    }
    Ok(())
}

/// Shared pre-insert validation for sales.
pub(crate) fn check_sale(sale: &Sale) -> Result<(), StoreError> {
    if sale.quantity_sold <= 0 {
        return Err(DomainError::validation("quantity_sold must be positive").into());
    }
    Ok(())
}
