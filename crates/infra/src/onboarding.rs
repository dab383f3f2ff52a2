//! CreateProductWithStock: onboard a SKU together with its first stock row.
//!
//! Order of work:
//! 1. validate the request (pure, no IO);
//! 2. cheap pre-checks against storage (warehouse exists, sku free);
//! 3. one atomic store call that writes product and inventory under a single
//!    commit.
//!
//! The pre-checks only avoid doomed transactions. Races between them and the
//! commit are settled by the storage constraints, whose violations are mapped
//! back onto the same Conflict / NotFound outcomes.

use std::sync::Arc;

use tracing::{Span, instrument};

use wareflow_catalog::{CreateProductRequest, InventoryRecord, OnboardingPlan, Product};

use crate::error::ServiceError;
use crate::store::{CatalogStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardedProduct {
    pub product: Product,
    pub initial_stock: InventoryRecord,
}

#[derive(Debug)]
pub struct ProductOnboarding<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ProductOnboarding<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ProductOnboarding<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, request),
        fields(
            sku = request.sku.as_deref().unwrap_or_default(),
            warehouse_id = ?request.warehouse_id,
            product_id = tracing::field::Empty
        )
    )]
    pub async fn create_product_with_stock(
        &self,
        request: &CreateProductRequest,
    ) -> Result<OnboardedProduct, ServiceError> {
        match self.onboard(request).await {
            Ok(onboarded) => {
                Span::current().record("product_id", onboarded.product.id.get());
                tracing::info!(
                    initial_quantity = onboarded.initial_stock.quantity.get(),
                    "product onboarded"
                );
                Ok(onboarded)
            }
            Err(err) => {
                match &err {
                    ServiceError::Storage(cause) => tracing::error!(error = %cause, "onboarding failed"),
                    other => tracing::warn!(kind = other.kind().as_str(), error = %other, "onboarding rejected"),
                }
                Err(err)
            }
        }
    }

    async fn onboard(&self, request: &CreateProductRequest) -> Result<OnboardedProduct, ServiceError> {
        let plan = request.validate()?;

        if !self.store.warehouse_exists(plan.warehouse_id).await? {
            return Err(warehouse_not_found(&plan));
        }
        if self.store.find_product_by_sku(&plan.product.sku).await?.is_some() {
            return Err(sku_taken(&plan));
        }

        let product = self
            .store
            .create_product_with_stock(&plan)
            .await
            .map_err(|err| match err {
                StoreError::UniqueViolation(_) => sku_taken(&plan),
                // The warehouse disappeared after the pre-check.
                StoreError::ForeignKeyViolation(_) => warehouse_not_found(&plan),
                other => other.into(),
            })?;

        Ok(OnboardedProduct {
            initial_stock: InventoryRecord {
                product_id: product.id,
                warehouse_id: plan.warehouse_id,
                quantity: plan.initial_quantity,
            },
            product,
        })
    }
}

fn sku_taken(plan: &OnboardingPlan) -> ServiceError {
    ServiceError::Conflict(format!("sku {} already exists", plan.product.sku))
}

fn warehouse_not_found(plan: &OnboardingPlan) -> ServiceError {
    ServiceError::NotFound(format!("warehouse {} not found", plan.warehouse_id))
}
