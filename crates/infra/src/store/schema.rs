//! SQLite schema bootstrap.
//!
//! Used by dev runs and tests to stand up an empty database. Each statement is
//! idempotent and executed on its own.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS companies (
        company_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS warehouses (
        warehouse_id INTEGER PRIMARY KEY,
        company_id INTEGER NOT NULL REFERENCES companies (company_id),
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS warehouses_company_idx ON warehouses (company_id)
    "#,
    // AUTOINCREMENT keeps ids of deleted products from being handed out again.
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id INTEGER PRIMARY KEY AUTOINCREMENT,
        sku TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        price_minor INTEGER NOT NULL CHECK (price_minor >= 0),
        is_bundle INTEGER NOT NULL DEFAULT 0,
        low_stock_threshold INTEGER NOT NULL DEFAULT 0 CHECK (low_stock_threshold >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory (
        product_id INTEGER NOT NULL REFERENCES products (product_id),
        warehouse_id INTEGER NOT NULL REFERENCES warehouses (warehouse_id),
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        PRIMARY KEY (product_id, warehouse_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_bundles (
        bundle_id INTEGER NOT NULL REFERENCES products (product_id),
        component_id INTEGER NOT NULL REFERENCES products (product_id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (bundle_id, component_id),
        CHECK (bundle_id <> component_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        supplier_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        contact_email TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_suppliers (
        product_id INTEGER NOT NULL REFERENCES products (product_id),
        supplier_id INTEGER NOT NULL REFERENCES suppliers (supplier_id),
        PRIMARY KEY (product_id, supplier_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        sale_id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products (product_id),
        warehouse_id INTEGER NOT NULL REFERENCES warehouses (warehouse_id),
        quantity_sold INTEGER NOT NULL CHECK (quantity_sold > 0),
        sale_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS sales_date_idx ON sales (sale_date)
    "#,
];
