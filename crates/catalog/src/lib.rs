//! Catalog domain module: companies, warehouses, products, stock and bundles.
//!
//! This crate contains business rules only, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage). Storage backends in `wareflow-infra`
//! call into it to validate input and to check invariants inside their
//! transactions.

pub mod alerts;
pub mod bundle;
pub mod entities;
pub mod onboarding;
pub mod values;

pub use alerts::{AlertSupplier, LowStockAlert, LowStockCandidate, WarehouseStock, evaluate_low_stock};
pub use bundle::{BundleGraph, BundleViolation, DEFAULT_MAX_BUNDLE_DEPTH};
pub use entities::{BundleComponent, Company, InventoryRecord, Product, Sale, Supplier, Warehouse};
pub use onboarding::{CreateProductRequest, OnboardingPlan, ProductDraft};
pub use values::{Price, Quantity, Sku};
