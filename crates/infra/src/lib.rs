//! Infrastructure layer: storage backends, catalog services and configuration.
//!
//! Services are generic over [`store::CatalogStore`] and hold it behind an
//! `Arc`, so the same instances can be shared by HTTP handlers and tests.

pub mod alerts;
pub mod bundles;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod queries;
pub mod seed;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use alerts::{LowStockAlerts, LowStockReport};
pub use bundles::BundleComposer;
pub use config::{AppConfig, ConfigError, LogFormat};
pub use error::{ErrorKind, ServiceError};
pub use onboarding::{OnboardedProduct, ProductOnboarding};
pub use queries::{CatalogQueries, ProductDetails};
pub use seed::{DemoCatalog, seed_demo};
pub use store::{CatalogStore, FailPoint, FailPoints, InMemoryCatalogStore, SqliteCatalogStore, StoreError};
