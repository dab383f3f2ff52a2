//! Bundle composition service.

use std::sync::Arc;

use tracing::instrument;

use wareflow_catalog::{BundleComponent, DEFAULT_MAX_BUNDLE_DEPTH};
use wareflow_core::ProductId;

use crate::error::ServiceError;
use crate::store::CatalogStore;

#[derive(Debug)]
pub struct BundleComposer<S: ?Sized> {
    store: Arc<S>,
    max_depth: usize,
}

impl<S: ?Sized> Clone for BundleComposer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_depth: self.max_depth,
        }
    }
}

impl<S> BundleComposer<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_max_depth(store, DEFAULT_MAX_BUNDLE_DEPTH)
    }

    pub fn with_max_depth(store: Arc<S>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Add `quantity` units of `component_id` to `bundle_id`.
    #[instrument(skip(self), err)]
    pub async fn add_component(
        &self,
        bundle_id: ProductId,
        component_id: ProductId,
        quantity: i64,
    ) -> Result<BundleComponent, ServiceError> {
        let edge = BundleComponent {
            bundle_id,
            component_id,
            quantity,
        };
        self.store.add_bundle_component(&edge, self.max_depth).await?;
        tracing::info!("bundle component added");
        Ok(edge)
    }

    /// Direct components of a bundle. Unknown products are NotFound; a plain
    /// product has no components.
    pub async fn components(&self, bundle_id: ProductId) -> Result<Vec<BundleComponent>, ServiceError> {
        if self.store.get_product(bundle_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("product {bundle_id} not found")));
        }
        Ok(self.store.bundle_components(bundle_id).await?)
    }
}
