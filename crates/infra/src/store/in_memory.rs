use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use wareflow_catalog::{
    BundleComponent, BundleGraph, Company, InventoryRecord, LowStockCandidate, OnboardingPlan, Product,
    Quantity, Sale, Sku, Supplier, Warehouse, WarehouseStock,
};
use wareflow_core::{CompanyId, Entity, ProductId, SupplierId, WarehouseId};

use super::{CatalogStore, FailPoint, FailPoints, RowCounts, StoreError, check_bundle_endpoints, check_sale};

#[derive(Debug, Default)]
struct State {
    companies: BTreeMap<CompanyId, Company>,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    products: BTreeMap<ProductId, Product>,
    /// Unique index on sku.
    skus: HashMap<Sku, ProductId>,
    inventory: BTreeMap<(ProductId, WarehouseId), Quantity>,
    bundles: BTreeMap<(ProductId, ProductId), i64>,
    suppliers: BTreeMap<SupplierId, Supplier>,
    product_suppliers: BTreeSet<(ProductId, SupplierId)>,
    sales: Vec<Sale>,
    last_product_id: i64,
}

/// Undo record for one write applied inside a [`Transaction`].
#[derive(Debug)]
enum Undo {
    Product(ProductId),
    Inventory(ProductId, WarehouseId),
    Bundle(ProductId, ProductId),
}

/// Write transaction over the locked state.
///
/// Holds the write lock for its whole life, so no reader can observe a
/// half-applied unit of work. Dropping it without [`Transaction::commit`]
/// reverts every write it made.
struct Transaction<'a> {
    state: RwLockWriteGuard<'a, State>,
    undo: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    fn new(state: RwLockWriteGuard<'a, State>) -> Self {
        Self { state, undo: Vec::new() }
    }

    fn insert_product(&mut self, product: Product) -> Result<(), StoreError> {
        if self.state.skus.contains_key(&product.sku) {
            return Err(StoreError::UniqueViolation(format!("products.sku = {}", product.sku)));
        }
        self.state.skus.insert(product.sku.clone(), product.id);
        let id = product.id();
        self.state.products.insert(id, product);
        self.undo.push(Undo::Product(id));
        Ok(())
    }

    fn insert_inventory(&mut self, record: &InventoryRecord) -> Result<(), StoreError> {
        if !self.state.products.contains_key(&record.product_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "inventory.product_id = {}",
                record.product_id
            )));
        }
        if !self.state.warehouses.contains_key(&record.warehouse_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "inventory.warehouse_id = {}",
                record.warehouse_id
            )));
        }
        let key = (record.product_id, record.warehouse_id);
        if self.state.inventory.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "inventory (product_id, warehouse_id) = ({}, {})",
                record.product_id, record.warehouse_id
            )));
        }
        self.state.inventory.insert(key, record.quantity);
        self.undo.push(Undo::Inventory(record.product_id, record.warehouse_id));
        Ok(())
    }

    fn insert_bundle_edge(&mut self, edge: &BundleComponent) {
        self.state
            .bundles
            .insert((edge.bundle_id, edge.component_id), edge.quantity);
        self.undo.push(Undo::Bundle(edge.bundle_id, edge.component_id));
    }

    fn commit(mut self) {
        self.undo.clear();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        tracing::debug!(writes = self.undo.len(), "rolling back in-memory transaction");
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Product(id) => {
                    if let Some(product) = self.state.products.remove(&id) {
                        self.state.skus.remove(&product.sku);
                    }
                }
                Undo::Inventory(product_id, warehouse_id) => {
                    self.state.inventory.remove(&(product_id, warehouse_id));
                }
                Undo::Bundle(bundle_id, component_id) => {
                    self.state.bundles.remove(&(bundle_id, component_id));
                }
            }
        }
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Writers are serialised by one `RwLock`; each write
/// method runs as a [`Transaction`] with rollback on every non-commit exit.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<State>,
    fail_points: FailPoints,
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_points(&self) -> &FailPoints {
        &self.fail_points
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn begin(&self) -> Result<Transaction<'_>, StoreError> {
        Ok(Transaction::new(self.state.write().map_err(|_| poisoned())?))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        if tx.state.companies.contains_key(&company.id) {
            return Err(StoreError::UniqueViolation(format!("companies.company_id = {}", company.id)));
        }
        tx.state.companies.insert(company.id(), company.clone());
        tx.commit();
        Ok(())
    }

    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        if !tx.state.companies.contains_key(&warehouse.company_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "warehouses.company_id = {}",
                warehouse.company_id
            )));
        }
        if tx.state.warehouses.contains_key(&warehouse.id) {
            return Err(StoreError::UniqueViolation(format!(
                "warehouses.warehouse_id = {}",
                warehouse.id
            )));
        }
        tx.state.warehouses.insert(warehouse.id(), warehouse.clone());
        tx.commit();
        Ok(())
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        if tx.state.suppliers.contains_key(&supplier.id) {
            return Err(StoreError::UniqueViolation(format!("suppliers.supplier_id = {}", supplier.id)));
        }
        tx.state.suppliers.insert(supplier.id(), supplier.clone());
        tx.commit();
        Ok(())
    }

    async fn link_supplier(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        if !tx.state.products.contains_key(&product_id) {
            return Err(StoreError::ForeignKeyViolation(format!("product_suppliers.product_id = {product_id}")));
        }
        if !tx.state.suppliers.contains_key(&supplier_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "product_suppliers.supplier_id = {supplier_id}"
            )));
        }
        if !tx.state.product_suppliers.insert((product_id, supplier_id)) {
            return Err(StoreError::UniqueViolation(format!(
                "product_suppliers = ({product_id}, {supplier_id})"
            )));
        }
        tx.commit();
        Ok(())
    }

    async fn insert_inventory(&self, record: &InventoryRecord) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        tx.insert_inventory(record)?;
        tx.commit();
        Ok(())
    }

    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        check_sale(sale)?;
        let mut tx = self.begin()?;
        if !tx.state.products.contains_key(&sale.product_id) {
            return Err(StoreError::ForeignKeyViolation(format!("sales.product_id = {}", sale.product_id)));
        }
        if !tx.state.warehouses.contains_key(&sale.warehouse_id) {
            return Err(StoreError::ForeignKeyViolation(format!("sales.warehouse_id = {}", sale.warehouse_id)));
        }
        tx.state.sales.push(sale.clone());
        tx.commit();
        Ok(())
    }

    async fn company_exists(&self, id: CompanyId) -> Result<bool, StoreError> {
        Ok(self.read()?.companies.contains_key(&id))
    }

    async fn warehouse_exists(&self, id: WarehouseId) -> Result<bool, StoreError> {
        Ok(self.read()?.warehouses.contains_key(&id))
    }

    async fn find_product_by_sku(&self, sku: &Sku) -> Result<Option<ProductId>, StoreError> {
        Ok(self.read()?.skus.get(sku).copied())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn inventory_for_product(&self, id: ProductId) -> Result<Vec<InventoryRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .inventory
            .range((id, WarehouseId::new(i64::MIN))..=(id, WarehouseId::new(i64::MAX)))
            .map(|((product_id, warehouse_id), quantity)| InventoryRecord {
                product_id: *product_id,
                warehouse_id: *warehouse_id,
                quantity: *quantity,
            })
            .collect())
    }

    async fn stock_level(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<Quantity>, StoreError> {
        Ok(self.read()?.inventory.get(&(product_id, warehouse_id)).copied())
    }

    async fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let state = self.read()?;
        Ok(RowCounts {
            products: state.products.len() as u64,
            inventory: state.inventory.len() as u64,
            bundle_edges: state.bundles.len() as u64,
        })
    }

    async fn create_product_with_stock(&self, plan: &OnboardingPlan) -> Result<Product, StoreError> {
        let mut tx = self.begin()?;

        let id = ProductId::new(tx.state.last_product_id + 1);
        let draft = &plan.product;
        let product = Product {
            id,
            sku: draft.sku.clone(),
            name: draft.name.clone(),
            price: draft.price,
            is_bundle: draft.is_bundle,
            low_stock_threshold: draft.low_stock_threshold,
        };

        tx.insert_product(product.clone())?;
        self.fail_points.check(FailPoint::AfterProductInsert)?;
        tx.insert_inventory(&InventoryRecord {
            product_id: id,
            warehouse_id: plan.warehouse_id,
            quantity: plan.initial_quantity,
        })?;
        self.fail_points.check(FailPoint::BeforeCommit)?;

        // Advanced only on commit: a rolled-back id goes to the next product.
        tx.state.last_product_id = id.get();
        tx.commit();
        Ok(product)
    }

    async fn add_bundle_component(&self, edge: &BundleComponent, max_depth: usize) -> Result<(), StoreError> {
        let mut tx = self.begin()?;
        let component_exists = tx.state.products.contains_key(&edge.component_id);
        check_bundle_endpoints(edge, tx.state.products.get(&edge.bundle_id), component_exists)?;

        let graph = BundleGraph::from_edges(tx.state.bundles.keys().copied());
        graph
            .check_insert(edge.bundle_id, edge.component_id, max_depth)
            .map_err(|v| StoreError::Rejected(v.into()))?;

        tx.insert_bundle_edge(edge);
        tx.commit();
        Ok(())
    }

    async fn bundle_components(&self, bundle_id: ProductId) -> Result<Vec<BundleComponent>, StoreError> {
        let state = self.read()?;
        Ok(state
            .bundles
            .iter()
            .filter(|((bundle, _), _)| *bundle == bundle_id)
            .map(|((bundle, component), quantity)| BundleComponent {
                bundle_id: *bundle,
                component_id: *component,
                quantity: *quantity,
            })
            .collect())
    }

    async fn low_stock_candidates(
        &self,
        company_id: CompanyId,
        since: NaiveDate,
    ) -> Result<Vec<LowStockCandidate>, StoreError> {
        let state = self.read()?;
        let company_warehouses: BTreeMap<WarehouseId, &Warehouse> = state
            .warehouses
            .values()
            .filter(|w| w.company_id == company_id)
            .map(|w| (w.id, w))
            .collect();

        let mut units_sold: BTreeMap<ProductId, i64> = BTreeMap::new();
        for sale in &state.sales {
            if sale.sale_date >= since && company_warehouses.contains_key(&sale.warehouse_id) {
                *units_sold.entry(sale.product_id).or_default() += sale.quantity_sold;
            }
        }

        let mut candidates = Vec::with_capacity(units_sold.len());
        for (product_id, sold) in units_sold {
            let Some(product) = state.products.get(&product_id) else {
                continue;
            };
            let stock = company_warehouses
                .values()
                .filter_map(|w| {
                    state.inventory.get(&(product_id, w.id)).map(|q| WarehouseStock {
                        warehouse_id: w.id,
                        warehouse_name: w.name.clone(),
                        quantity: q.get(),
                    })
                })
                .collect();
            let supplier = state
                .product_suppliers
                .iter()
                .filter(|(p, _)| *p == product_id)
                .filter_map(|(_, s)| state.suppliers.get(s))
                .min_by_key(|s| s.id)
                .cloned();

            candidates.push(LowStockCandidate {
                product_id,
                product_name: product.name.clone(),
                sku: product.sku.to_string(),
                threshold: product.low_stock_threshold.get(),
                stock,
                units_sold: sold,
                supplier,
            });
        }
        Ok(candidates)
    }
}
