//! Read-side lookups over the catalog.

use std::sync::Arc;

use wareflow_catalog::{InventoryRecord, Product, Quantity};
use wareflow_core::{ProductId, WarehouseId};

use crate::error::ServiceError;
use crate::store::CatalogStore;

/// A product with every inventory row it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub product: Product,
    pub inventory: Vec<InventoryRecord>,
}

#[derive(Debug)]
pub struct CatalogQueries<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CatalogQueries<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CatalogQueries<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn product(&self, id: ProductId) -> Result<ProductDetails, ServiceError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id} not found")))?;
        let inventory = self.store.inventory_for_product(id).await?;
        Ok(ProductDetails { product, inventory })
    }

    pub async fn stock_level(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Quantity, ServiceError> {
        self.store
            .stock_level(product_id, warehouse_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no stock record for product {product_id} in warehouse {warehouse_id}"
                ))
            })
    }
}
