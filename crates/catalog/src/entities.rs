use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wareflow_core::{CompanyId, Entity, ProductId, SupplierId, WarehouseId};

use crate::values::{Price, Quantity, Sku};

/// Company: owner of warehouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Warehouse: belongs to exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub company_id: CompanyId,
    pub name: String,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Product as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub price: Price,
    pub is_bundle: bool,
    /// Total company stock below this triggers a low-stock alert (0 = never).
    pub low_stock_threshold: Quantity,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Stock of one product in one warehouse. At most one per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: Quantity,
}

/// Directed edge bundle -> component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleComponent {
    pub bundle_id: ProductId,
    pub component_id: ProductId,
    /// Units of the component contained in one bundle (always >= 1).
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_email: String,
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A recorded sale. Input to the low-stock report only; never moves stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity_sold: i64,
    pub sale_date: NaiveDate,
}
