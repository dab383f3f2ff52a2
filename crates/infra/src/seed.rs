//! Demo dataset: one company, two warehouses, two products with sales history.
//!
//! Reported as of 2025-08-02 with a 30 day window, the dataset produces a
//! single alert for Widget A at Main Warehouse.

use std::sync::Arc;

use chrono::NaiveDate;

use wareflow_catalog::{Company, CreateProductRequest, InventoryRecord, Quantity, Sale, Supplier, Warehouse};
use wareflow_core::{CompanyId, ProductId, SupplierId, WarehouseId};

use crate::error::ServiceError;
use crate::onboarding::ProductOnboarding;
use crate::store::CatalogStore;

pub const DEMO_COMPANY: CompanyId = CompanyId::new(1);
pub const MAIN_WAREHOUSE: WarehouseId = WarehouseId::new(456);
pub const WEST_COAST_HUB: WarehouseId = WarehouseId::new(457);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DemoCatalog {
    pub company_id: CompanyId,
    pub widget_a: ProductId,
    pub gadget_b: ProductId,
}

struct DemoProduct {
    name: &'static str,
    sku: &'static str,
    price: f64,
    threshold: i64,
    stock: [(WarehouseId, i64); 2],
    supplier: SupplierId,
    sales: &'static [(WarehouseId, i64, (i32, u32, u32))],
}

const WIDGET_A: DemoProduct = DemoProduct {
    name: "Widget A",
    sku: "WID-001",
    price: 12.5,
    threshold: 20,
    stock: [(MAIN_WAREHOUSE, 5), (WEST_COAST_HUB, 10)],
    supplier: SupplierId::new(789),
    sales: &[(MAIN_WAREHOUSE, 20, (2025, 7, 23)), (WEST_COAST_HUB, 18, (2025, 7, 28))],
};

const GADGET_B: DemoProduct = DemoProduct {
    name: "Gadget B",
    sku: "GAD-002",
    price: 24.0,
    threshold: 50,
    stock: [(MAIN_WAREHOUSE, 30), (WEST_COAST_HUB, 40)],
    supplier: SupplierId::new(790),
    // Outside the default window.
    sales: &[(MAIN_WAREHOUSE, 2, (2025, 6, 18))],
};

/// Load the demo dataset. Returns `Ok(None)` when the demo company already
/// exists, so reseeding a persistent database is a no-op.
pub async fn seed_demo<S>(store: Arc<S>) -> Result<Option<DemoCatalog>, ServiceError>
where
    S: CatalogStore + ?Sized,
{
    if store.company_exists(DEMO_COMPANY).await? {
        tracing::info!(company_id = %DEMO_COMPANY, "demo data already present");
        return Ok(None);
    }

    store
        .insert_company(&Company {
            id: DEMO_COMPANY,
            name: "Gadget Corp".to_string(),
        })
        .await?;
    for (id, name) in [(MAIN_WAREHOUSE, "Main Warehouse"), (WEST_COAST_HUB, "West Coast Hub")] {
        store
            .insert_warehouse(&Warehouse {
                id,
                company_id: DEMO_COMPANY,
                name: name.to_string(),
            })
            .await?;
    }
    for (id, name, email) in [
        (SupplierId::new(789), "Supplier Corp", "orders@supplier.com"),
        (SupplierId::new(790), "Component Masters", "sales@components.com"),
    ] {
        store
            .insert_supplier(&Supplier {
                id,
                name: name.to_string(),
                contact_email: email.to_string(),
            })
            .await?;
    }

    let onboarding = ProductOnboarding::new(Arc::clone(&store));
    let widget_a = seed_product(store.as_ref(), &onboarding, &WIDGET_A).await?;
    let gadget_b = seed_product(store.as_ref(), &onboarding, &GADGET_B).await?;

    tracing::info!(company_id = %DEMO_COMPANY, "demo data seeded");
    Ok(Some(DemoCatalog {
        company_id: DEMO_COMPANY,
        widget_a,
        gadget_b,
    }))
}

async fn seed_product<S>(
    store: &S,
    onboarding: &ProductOnboarding<S>,
    demo: &DemoProduct,
) -> Result<ProductId, ServiceError>
where
    S: CatalogStore + ?Sized,
{
    let [(first_warehouse, first_quantity), rest @ ..] = demo.stock;
    let onboarded = onboarding
        .create_product_with_stock(&CreateProductRequest {
            name: Some(demo.name.to_string()),
            sku: Some(demo.sku.to_string()),
            price: Some(demo.price),
            warehouse_id: Some(first_warehouse.get()),
            initial_quantity: Some(first_quantity),
            is_bundle: Some(false),
            low_stock_threshold: Some(demo.threshold),
        })
        .await?;
    let product_id = onboarded.product.id;

    for (warehouse_id, quantity) in rest {
        store
            .insert_inventory(&InventoryRecord {
                product_id,
                warehouse_id,
                quantity: Quantity::new(quantity)?,
            })
            .await?;
    }
    store.link_supplier(product_id, demo.supplier).await?;

    for &(warehouse_id, quantity_sold, (y, m, d)) in demo.sales {
        let sale_date = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| ServiceError::Validation(format!("invalid demo sale date {y}-{m}-{d}")))?;
        store
            .record_sale(&Sale {
                product_id,
                warehouse_id,
                quantity_sold,
                sale_date,
            })
            .await?;
    }
    Ok(product_id)
}
