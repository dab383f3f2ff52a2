//! SQLite-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (unique / primary key) | `UniqueViolation` |
//! | Database (foreign key) | `ForeignKeyViolation` |
//! | Database (other, incl. `SQLITE_BUSY`) | `Backend` |
//! | PoolClosed, RowNotFound, Io, ... | `Backend` |
//!
//! ## Transactions
//!
//! Multi-row writes run in a single `DEFERRED` transaction. SQLite admits one
//! writer at a time; a transaction whose snapshot went stale before its first
//! write fails with `SQLITE_BUSY` instead of committing, so checks done inside
//! the transaction hold at commit time.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{Span, instrument};

use wareflow_catalog::{
    BundleComponent, BundleGraph, Company, InventoryRecord, LowStockCandidate, OnboardingPlan, Price, Product,
    Quantity, Sale, Sku, Supplier, Warehouse, WarehouseStock,
};
use wareflow_core::{CompanyId, ProductId, SupplierId, WarehouseId};

use super::{
    CatalogStore, FailPoint, FailPoints, RowCounts, StoreError, check_bundle_endpoints, check_sale, schema,
};

#[derive(Debug)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
    fail_points: FailPoints,
}

/// `sqlite::memory:` and `mode=memory` URLs give every connection its own
/// private database.
fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

impl SqliteCatalogStore {
    /// Open a pool against `url`, creating the database file if needed.
    ///
    /// In-memory databases are pinned to one long-lived connection.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if is_memory_url(url) {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            fail_points: FailPoints::new(),
        }
    }

    pub fn fail_points(&self) -> &FailPoints {
        &self.fail_points
    }

    /// Create the catalog tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn bootstrap_schema(&self) -> Result<(), StoreError> {
        for statement in schema::STATEMENTS {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("bootstrap_schema", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn insert_product_and_stock(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        plan: &OnboardingPlan,
    ) -> Result<Product, StoreError> {
        let draft = &plan.product;
        let result = sqlx::query(
            r#"
            INSERT INTO products (sku, name, price_minor, is_bundle, low_stock_threshold)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.sku.as_str())
        .bind(&draft.name)
        .bind(draft.price.minor_units())
        .bind(draft.is_bundle)
        .bind(draft.low_stock_threshold.get())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        let id = ProductId::new(result.last_insert_rowid());
        Span::current().record("product_id", id.get());

        self.fail_points.check(FailPoint::AfterProductInsert)?;

        sqlx::query("INSERT INTO inventory (product_id, warehouse_id, quantity) VALUES (?, ?, ?)")
            .bind(id.get())
            .bind(plan.warehouse_id.get())
            .bind(plan.initial_quantity.get())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_inventory", e))?;

        self.fail_points.check(FailPoint::BeforeCommit)?;

        Ok(Product {
            id,
            sku: draft.sku.clone(),
            name: draft.name.clone(),
            price: draft.price,
            is_bundle: draft.is_bundle,
            low_stock_threshold: draft.low_stock_threshold,
        })
    }

    async fn check_and_insert_edge(
        &self,
        tx: &mut Transaction<'static, Sqlite>,
        edge: &BundleComponent,
        max_depth: usize,
    ) -> Result<(), StoreError> {
        let bundle = fetch_product(&mut **tx, edge.bundle_id).await?;
        let component_exists = fetch_product(&mut **tx, edge.component_id).await?.is_some();
        check_bundle_endpoints(edge, bundle.as_ref(), component_exists)?;

        let rows = sqlx::query("SELECT bundle_id, component_id FROM product_bundles")
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("load_bundle_edges", e))?;
        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            let bundle_id: i64 = row.try_get("bundle_id").map_err(corrupt)?;
            let component_id: i64 = row.try_get("component_id").map_err(corrupt)?;
            edges.push((ProductId::new(bundle_id), ProductId::new(component_id)));
        }

        BundleGraph::from_edges(edges)
            .check_insert(edge.bundle_id, edge.component_id, max_depth)
            .map_err(|v| StoreError::Rejected(v.into()))?;

        sqlx::query("INSERT INTO product_bundles (bundle_id, component_id, quantity) VALUES (?, ?, ?)")
            .bind(edge.bundle_id.get())
            .bind(edge.component_id.get())
            .bind(edge.quantity)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_bundle_edge", e))?;
        Ok(())
    }

    async fn execute<'q>(
        &self,
        operation: &str,
        query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<(), StoreError> {
        query
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(())
    }
}

async fn rollback(tx: Transaction<'static, Sqlite>, err: StoreError) -> StoreError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(error = %rollback_err, "rollback failed");
    }
    err
}

async fn commit(tx: Transaction<'static, Sqlite>) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn fetch_product<'e, E>(executor: E, id: ProductId) -> Result<Option<Product>, StoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT product_id, sku, name, price_minor, is_bundle, low_stock_threshold
        FROM products
        WHERE product_id = ?
        "#,
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("get_product", e))?;

    row.as_ref().map(product_from_row).transpose()
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        self.execute(
            "insert_company",
            sqlx::query("INSERT INTO companies (company_id, name) VALUES (?, ?)")
                .bind(company.id.get())
                .bind(&company.name),
        )
        .await
    }

    #[instrument(skip(self, warehouse), fields(warehouse_id = %warehouse.id), err)]
    async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        self.execute(
            "insert_warehouse",
            sqlx::query("INSERT INTO warehouses (warehouse_id, company_id, name) VALUES (?, ?, ?)")
                .bind(warehouse.id.get())
                .bind(warehouse.company_id.get())
                .bind(&warehouse.name),
        )
        .await
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
        self.execute(
            "insert_supplier",
            sqlx::query("INSERT INTO suppliers (supplier_id, name, contact_email) VALUES (?, ?, ?)")
                .bind(supplier.id.get())
                .bind(&supplier.name)
                .bind(&supplier.contact_email),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn link_supplier(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<(), StoreError> {
        self.execute(
            "link_supplier",
            sqlx::query("INSERT INTO product_suppliers (product_id, supplier_id) VALUES (?, ?)")
                .bind(product_id.get())
                .bind(supplier_id.get()),
        )
        .await
    }

    #[instrument(skip(self, record), fields(product_id = %record.product_id, warehouse_id = %record.warehouse_id), err)]
    async fn insert_inventory(&self, record: &InventoryRecord) -> Result<(), StoreError> {
        self.execute(
            "insert_inventory",
            sqlx::query("INSERT INTO inventory (product_id, warehouse_id, quantity) VALUES (?, ?, ?)")
                .bind(record.product_id.get())
                .bind(record.warehouse_id.get())
                .bind(record.quantity.get()),
        )
        .await
    }

    #[instrument(skip(self, sale), fields(product_id = %sale.product_id), err)]
    async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        check_sale(sale)?;
        self.execute(
            "record_sale",
            sqlx::query(
                "INSERT INTO sales (product_id, warehouse_id, quantity_sold, sale_date) VALUES (?, ?, ?, ?)",
            )
            .bind(sale.product_id.get())
            .bind(sale.warehouse_id.get())
            .bind(sale.quantity_sold)
            .bind(sale.sale_date),
        )
        .await
    }

    async fn company_exists(&self, id: CompanyId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM companies WHERE company_id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company_exists", e))?;
        Ok(row.is_some())
    }

    async fn warehouse_exists(&self, id: WarehouseId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM warehouses WHERE warehouse_id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("warehouse_exists", e))?;
        Ok(row.is_some())
    }

    async fn find_product_by_sku(&self, sku: &Sku) -> Result<Option<ProductId>, StoreError> {
        let row = sqlx::query("SELECT product_id FROM products WHERE sku = ?")
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product_by_sku", e))?;
        row.map(|r| r.try_get::<i64, _>("product_id").map(ProductId::new).map_err(corrupt))
            .transpose()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        fetch_product(&self.pool, id).await
    }

    async fn inventory_for_product(&self, id: ProductId) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT product_id, warehouse_id, quantity FROM inventory WHERE product_id = ? ORDER BY warehouse_id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory_for_product", e))?;

        rows.iter().map(inventory_from_row).collect()
    }

    async fn stock_level(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<Option<Quantity>, StoreError> {
        let row = sqlx::query("SELECT quantity FROM inventory WHERE product_id = ? AND warehouse_id = ?")
            .bind(product_id.get())
            .bind(warehouse_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("stock_level", e))?;

        row.map(|r| {
            let quantity: i64 = r.try_get("quantity").map_err(corrupt)?;
            Quantity::new(quantity).map_err(|e| StoreError::Corrupt(e.to_string()))
        })
        .transpose()
    }

    async fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM inventory) AS inventory,
                (SELECT COUNT(*) FROM product_bundles) AS bundle_edges
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("row_counts", e))?;

        let count = |column: &str| -> Result<u64, StoreError> {
            let n: i64 = row.try_get(column).map_err(corrupt)?;
            Ok(n.max(0) as u64)
        };
        Ok(RowCounts {
            products: count("products")?,
            inventory: count("inventory")?,
            bundle_edges: count("bundle_edges")?,
        })
    }

    #[instrument(
        skip(self, plan),
        fields(
            sku = %plan.product.sku,
            warehouse_id = %plan.warehouse_id,
            product_id = tracing::field::Empty
        ),
        err
    )]
    async fn create_product_with_stock(&self, plan: &OnboardingPlan) -> Result<Product, StoreError> {
        let mut tx = self.begin().await?;
        match self.insert_product_and_stock(&mut tx, plan).await {
            Ok(product) => {
                commit(tx).await?;
                Ok(product)
            }
            Err(err) => Err(rollback(tx, err).await),
        }
    }

    #[instrument(
        skip(self, edge),
        fields(bundle_id = %edge.bundle_id, component_id = %edge.component_id),
        err
    )]
    async fn add_bundle_component(&self, edge: &BundleComponent, max_depth: usize) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        match self.check_and_insert_edge(&mut tx, edge, max_depth).await {
            Ok(()) => commit(tx).await,
            Err(err) => Err(rollback(tx, err).await),
        }
    }

    async fn bundle_components(&self, bundle_id: ProductId) -> Result<Vec<BundleComponent>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT bundle_id, component_id, quantity
            FROM product_bundles
            WHERE bundle_id = ?
            ORDER BY component_id
            "#,
        )
        .bind(bundle_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("bundle_components", e))?;

        let mut components = Vec::with_capacity(rows.len());
        for row in rows {
            components.push(BundleComponent {
                bundle_id: ProductId::new(row.try_get("bundle_id").map_err(corrupt)?),
                component_id: ProductId::new(row.try_get("component_id").map_err(corrupt)?),
                quantity: row.try_get("quantity").map_err(corrupt)?,
            });
        }
        Ok(components)
    }

    #[instrument(
        skip(self),
        fields(company_id = %company_id, candidates = tracing::field::Empty),
        err
    )]
    async fn low_stock_candidates(
        &self,
        company_id: CompanyId,
        since: NaiveDate,
    ) -> Result<Vec<LowStockCandidate>, StoreError> {
        let sold = sqlx::query(
            r#"
            SELECT s.product_id, SUM(s.quantity_sold) AS units_sold
            FROM sales s
            JOIN warehouses w ON w.warehouse_id = s.warehouse_id
            WHERE w.company_id = ? AND s.sale_date >= ?
            GROUP BY s.product_id
            ORDER BY s.product_id
            "#,
        )
        .bind(company_id.get())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_sales", e))?;

        let mut candidates = Vec::with_capacity(sold.len());
        for row in sold {
            let product_id = ProductId::new(row.try_get("product_id").map_err(corrupt)?);
            let units_sold: i64 = row.try_get("units_sold").map_err(corrupt)?;
            let Some(product) = fetch_product(&self.pool, product_id).await? else {
                continue;
            };

            let stock_rows = sqlx::query(
                r#"
                SELECT i.warehouse_id, w.name, i.quantity
                FROM inventory i
                JOIN warehouses w ON w.warehouse_id = i.warehouse_id
                WHERE i.product_id = ? AND w.company_id = ?
                ORDER BY i.warehouse_id
                "#,
            )
            .bind(product_id.get())
            .bind(company_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("company_stock", e))?;

            let mut stock = Vec::with_capacity(stock_rows.len());
            for s in stock_rows {
                stock.push(WarehouseStock {
                    warehouse_id: WarehouseId::new(s.try_get("warehouse_id").map_err(corrupt)?),
                    warehouse_name: s.try_get("name").map_err(corrupt)?,
                    quantity: s.try_get("quantity").map_err(corrupt)?,
                });
            }

            let supplier = sqlx::query(
                r#"
                SELECT s.supplier_id, s.name, s.contact_email
                FROM product_suppliers ps
                JOIN suppliers s ON s.supplier_id = ps.supplier_id
                WHERE ps.product_id = ?
                ORDER BY s.supplier_id
                LIMIT 1
                "#,
            )
            .bind(product_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("primary_supplier", e))?
            .map(|r| supplier_from_row(&r))
            .transpose()?;

            candidates.push(LowStockCandidate {
                product_id,
                product_name: product.name,
                sku: product.sku.to_string(),
                threshold: product.low_stock_threshold.get(),
                stock,
                units_sold,
                supplier,
            });
        }

        Span::current().record("candidates", candidates.len());
        Ok(candidates)
    }
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    let sku: String = row.try_get("sku").map_err(corrupt)?;
    let price_minor: i64 = row.try_get("price_minor").map_err(corrupt)?;
    let threshold: i64 = row.try_get("low_stock_threshold").map_err(corrupt)?;
    let bad = |e: wareflow_core::DomainError| StoreError::Corrupt(e.to_string());

    Ok(Product {
        id: ProductId::new(row.try_get("product_id").map_err(corrupt)?),
        sku: Sku::parse(&sku).map_err(bad)?,
        name: row.try_get("name").map_err(corrupt)?,
        price: Price::from_minor_units(price_minor).map_err(bad)?,
        is_bundle: row.try_get("is_bundle").map_err(corrupt)?,
        low_stock_threshold: Quantity::new(threshold).map_err(bad)?,
    })
}

fn inventory_from_row(row: &SqliteRow) -> Result<InventoryRecord, StoreError> {
    let quantity: i64 = row.try_get("quantity").map_err(corrupt)?;
    Ok(InventoryRecord {
        product_id: ProductId::new(row.try_get("product_id").map_err(corrupt)?),
        warehouse_id: WarehouseId::new(row.try_get("warehouse_id").map_err(corrupt)?),
        quantity: Quantity::new(quantity).map_err(|e| StoreError::Corrupt(e.to_string()))?,
    })
}

fn supplier_from_row(row: &SqliteRow) -> Result<Supplier, StoreError> {
    Ok(Supplier {
        id: SupplierId::new(row.try_get("supplier_id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        contact_email: row.try_get("contact_email").map_err(corrupt)?,
    })
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() {
                StoreError::UniqueViolation(msg)
            } else if db_err.is_foreign_key_violation() {
                StoreError::ForeignKeyViolation(msg)
            } else {
                // Check violations and SQLITE_BUSY land here.
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        sqlx::Error::RowNotFound => StoreError::Backend(format!("unexpected row not found in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
