//! Integration tests for the catalog services over both storage backends.
//!
//! Verifies:
//! - product and initial inventory become visible together or not at all
//! - sku uniqueness holds under concurrent onboarding, including callers
//!   that all passed the pre-check
//! - bundle edges keep the graph acyclic and within the depth cap
//! - the low-stock report over the demo dataset

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::sync::Barrier;

    use wareflow_catalog::{
        BundleComponent, Company, CreateProductRequest, InventoryRecord, LowStockCandidate, OnboardingPlan,
        Product, Quantity, Sale, Sku, Supplier, Warehouse,
    };
    use wareflow_core::{CompanyId, ProductId, SupplierId, WarehouseId};

    use crate::alerts::LowStockAlerts;
    use crate::bundles::BundleComposer;
    use crate::error::ServiceError;
    use crate::onboarding::ProductOnboarding;
    use crate::queries::CatalogQueries;
    use crate::seed::{self, MAIN_WAREHOUSE};
    use crate::store::{
        CatalogStore, FailPoint, FailPoints, InMemoryCatalogStore, RowCounts, SqliteCatalogStore, StoreError,
    };

    enum Backend {
        Memory(Arc<InMemoryCatalogStore>),
        Sqlite(Arc<SqliteCatalogStore>),
    }

    impl Backend {
        fn name(&self) -> &'static str {
            match self {
                Backend::Memory(_) => "memory",
                Backend::Sqlite(_) => "sqlite",
            }
        }

        fn store(&self) -> Arc<dyn CatalogStore> {
            match self {
                Backend::Memory(s) => s.clone(),
                Backend::Sqlite(s) => s.clone(),
            }
        }

        fn fail_points(&self) -> &FailPoints {
            match self {
                Backend::Memory(s) => s.fail_points(),
                Backend::Sqlite(s) => s.fail_points(),
            }
        }
    }

    async fn backends() -> Vec<Backend> {
        let sqlite = SqliteCatalogStore::connect("sqlite::memory:", 1).await.unwrap();
        sqlite.bootstrap_schema().await.unwrap();
        vec![
            Backend::Memory(Arc::new(InMemoryCatalogStore::new())),
            Backend::Sqlite(Arc::new(sqlite)),
        ]
    }

    /// Company 1 with warehouse 1.
    async fn with_warehouse() -> Vec<Backend> {
        let backends = backends().await;
        for b in &backends {
            seed_company_and_warehouse(b.store().as_ref()).await;
        }
        backends
    }

    /// Holds every `create_product_with_stock` call at a barrier until
    /// `parties` callers have arrived, so all of them pass the service's
    /// pre-checks before any of them writes.
    struct RacingStore {
        inner: Arc<dyn CatalogStore>,
        gate: Barrier,
        creates: AtomicUsize,
    }

    impl RacingStore {
        fn new(inner: Arc<dyn CatalogStore>, parties: usize) -> Self {
            Self {
                inner,
                gate: Barrier::new(parties),
                creates: AtomicUsize::new(0),
            }
        }

        fn creates(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogStore for RacingStore {
        async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
            self.inner.insert_company(company).await
        }

        async fn insert_warehouse(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
            self.inner.insert_warehouse(warehouse).await
        }

        async fn insert_supplier(&self, supplier: &Supplier) -> Result<(), StoreError> {
            self.inner.insert_supplier(supplier).await
        }

        async fn link_supplier(&self, product_id: ProductId, supplier_id: SupplierId) -> Result<(), StoreError> {
            self.inner.link_supplier(product_id, supplier_id).await
        }

        async fn insert_inventory(&self, record: &InventoryRecord) -> Result<(), StoreError> {
            self.inner.insert_inventory(record).await
        }

        async fn record_sale(&self, sale: &Sale) -> Result<(), StoreError> {
            self.inner.record_sale(sale).await
        }

        async fn company_exists(&self, id: CompanyId) -> Result<bool, StoreError> {
            self.inner.company_exists(id).await
        }

        async fn warehouse_exists(&self, id: WarehouseId) -> Result<bool, StoreError> {
            self.inner.warehouse_exists(id).await
        }

        async fn find_product_by_sku(&self, sku: &Sku) -> Result<Option<ProductId>, StoreError> {
            self.inner.find_product_by_sku(sku).await
        }

        async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
            self.inner.get_product(id).await
        }

        async fn inventory_for_product(&self, id: ProductId) -> Result<Vec<InventoryRecord>, StoreError> {
            self.inner.inventory_for_product(id).await
        }

        async fn stock_level(
            &self,
            product_id: ProductId,
            warehouse_id: WarehouseId,
        ) -> Result<Option<Quantity>, StoreError> {
            self.inner.stock_level(product_id, warehouse_id).await
        }

        async fn row_counts(&self) -> Result<RowCounts, StoreError> {
            self.inner.row_counts().await
        }

        async fn create_product_with_stock(&self, plan: &OnboardingPlan) -> Result<Product, StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.gate.wait().await;
            self.inner.create_product_with_stock(plan).await
        }

        async fn add_bundle_component(&self, edge: &BundleComponent, max_depth: usize) -> Result<(), StoreError> {
            self.inner.add_bundle_component(edge, max_depth).await
        }

        async fn bundle_components(&self, bundle_id: ProductId) -> Result<Vec<BundleComponent>, StoreError> {
            self.inner.bundle_components(bundle_id).await
        }

        async fn low_stock_candidates(
            &self,
            company_id: CompanyId,
            since: NaiveDate,
        ) -> Result<Vec<LowStockCandidate>, StoreError> {
            self.inner.low_stock_candidates(company_id, since).await
        }
    }

    async fn seed_company_and_warehouse(store: &dyn CatalogStore) {
        store
            .insert_company(&Company { id: CompanyId::new(1), name: "Acme".to_string() })
            .await
            .unwrap();
        store
            .insert_warehouse(&Warehouse {
                id: WarehouseId::new(1),
                company_id: CompanyId::new(1),
                name: "Main".to_string(),
            })
            .await
            .unwrap();
    }

    fn widget(sku: &str, warehouse_id: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: Some("Widget".to_string()),
            sku: Some(sku.to_string()),
            price: Some(9.99),
            warehouse_id: Some(warehouse_id),
            initial_quantity: Some(50),
            ..Default::default()
        }
    }

    fn bundle(sku: &str) -> CreateProductRequest {
        CreateProductRequest {
            is_bundle: Some(true),
            ..widget(sku, 1)
        }
    }

    #[tokio::test]
    async fn onboarding_writes_product_and_stock_together() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let out = svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap();

            let queries = CatalogQueries::new(b.store());
            let stock = queries.stock_level(out.product.id, WarehouseId::new(1)).await.unwrap();
            assert_eq!(stock, Quantity::new(50).unwrap(), "{}", b.name());

            let details = queries.product(out.product.id).await.unwrap();
            assert_eq!(details.product.price.minor_units(), 999, "{}", b.name());
            assert_eq!(details.inventory.len(), 1, "{}", b.name());

            let counts = b.store().row_counts().await.unwrap();
            assert_eq!((counts.products, counts.inventory), (1, 1), "{}", b.name());
        }
    }

    #[tokio::test]
    async fn repeated_sku_conflicts_and_keeps_one_inventory_row() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let first = svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap();

            let err = svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(_)), "{}: {err:?}", b.name());

            let rows = b.store().inventory_for_product(first.product.id).await.unwrap();
            assert_eq!(rows.len(), 1, "{}", b.name());
            assert_eq!(b.store().row_counts().await.unwrap().products, 1, "{}", b.name());
        }
    }

    #[tokio::test]
    async fn unknown_warehouse_is_not_found_and_writes_nothing() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let err = svc.create_product_with_stock(&widget("W-100", 999)).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)), "{}: {err:?}", b.name());
            assert_eq!(b.store().row_counts().await.unwrap(), RowCounts::default(), "{}", b.name());
        }
    }

    #[tokio::test]
    async fn invalid_requests_write_nothing() {
        let invalid = [
            CreateProductRequest { name: Some("  ".to_string()), ..widget("W-1", 1) },
            CreateProductRequest { sku: None, ..widget("W-1", 1) },
            CreateProductRequest { sku: Some("W 1".to_string()), ..widget("W-1", 1) },
            CreateProductRequest { price: Some(-0.01), ..widget("W-1", 1) },
            CreateProductRequest { price: Some(1.005), ..widget("W-1", 1) },
            CreateProductRequest { initial_quantity: Some(-1), ..widget("W-1", 1) },
            CreateProductRequest { low_stock_threshold: Some(-3), ..widget("W-1", 1) },
        ];
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            for req in &invalid {
                let err = svc.create_product_with_stock(req).await.unwrap_err();
                assert!(matches!(err, ServiceError::Validation(_)), "{}: {req:?} -> {err:?}", b.name());
            }
            assert_eq!(b.store().row_counts().await.unwrap(), RowCounts::default(), "{}", b.name());
        }
    }

    #[tokio::test]
    async fn failure_between_inserts_leaves_no_orphan() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            for point in [FailPoint::AfterProductInsert, FailPoint::BeforeCommit] {
                b.fail_points().arm(point);
                let err = svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap_err();
                assert_eq!(err, ServiceError::Storage(StoreError::FailPoint(point)), "{}", b.name());
                assert_eq!(b.store().row_counts().await.unwrap(), RowCounts::default(), "{}", b.name());
            }

            // Nothing was left behind that would block a retry.
            svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn concurrent_onboarding_of_one_sku_admits_a_single_winner() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let req = widget("W-100", 1);
            let (a, c) = tokio::join!(svc.create_product_with_stock(&req), svc.create_product_with_stock(&req));

            let outcomes = [a, c];
            let wins = outcomes.iter().filter(|r| r.is_ok()).count();
            let conflicts = outcomes
                .iter()
                .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
                .count();
            assert_eq!((wins, conflicts), (1, 1), "{}", b.name());

            let counts = b.store().row_counts().await.unwrap();
            assert_eq!((counts.products, counts.inventory), (1, 1), "{}", b.name());
        }
    }

    #[tokio::test]
    async fn racers_past_the_sku_precheck_are_settled_by_the_store() {
        for b in with_warehouse().await {
            let store = Arc::new(RacingStore::new(b.store(), 2));
            let svc = ProductOnboarding::new(store.clone());
            let req = widget("W-100", 1);
            let (a, c) = tokio::join!(svc.create_product_with_stock(&req), svc.create_product_with_stock(&req));

            // Both calls reached the store; neither was stopped by the pre-check.
            assert_eq!(store.creates(), 2, "{}", b.name());

            let (winner, loser) = match (a, c) {
                (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
                other => panic!("{}: expected one winner, got {other:?}", b.name()),
            };
            assert_eq!(
                loser,
                ServiceError::Conflict("sku W-100 already exists".to_string()),
                "{}",
                b.name()
            );

            let counts = b.store().row_counts().await.unwrap();
            assert_eq!((counts.products, counts.inventory), (1, 1), "{}", b.name());
            let rows = b.store().inventory_for_product(winner.product.id).await.unwrap();
            assert_eq!(rows, vec![winner.initial_stock], "{}", b.name());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn file_backed_sqlite_admits_one_winner_across_connections() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let store = Arc::new(SqliteCatalogStore::connect(&url, 8).await.unwrap());
        store.bootstrap_schema().await.unwrap();
        seed_company_and_warehouse(store.as_ref()).await;

        let svc = ProductOnboarding::new(store.clone());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.create_product_with_stock(&widget("W-100", 1)).await })
            })
            .collect();

        let (mut wins, mut conflicts, mut other) = (0, 0, Vec::new());
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(ServiceError::Conflict(_)) => conflicts += 1,
                Err(err) => other.push(err),
            }
        }
        assert_eq!((wins, conflicts), (1, 15), "unexpected outcomes: {other:?}");

        let counts = store.row_counts().await.unwrap();
        assert_eq!((counts.products, counts.inventory), (1, 1));
    }

    #[tokio::test]
    async fn rolled_back_insert_does_not_consume_an_id() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let first = svc.create_product_with_stock(&widget("A", 1)).await.unwrap();

            b.fail_points().arm(FailPoint::BeforeCommit);
            svc.create_product_with_stock(&widget("B", 1)).await.unwrap_err();

            let next = svc.create_product_with_stock(&widget("C", 1)).await.unwrap();
            assert_eq!(next.product.id.get(), first.product.id.get() + 1, "{}", b.name());
        }
    }

    #[tokio::test]
    async fn non_positive_sales_are_rejected_as_validation() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let out = svc.create_product_with_stock(&widget("W-100", 1)).await.unwrap();
            for quantity_sold in [0, -3] {
                let sale = Sale {
                    product_id: out.product.id,
                    warehouse_id: WarehouseId::new(1),
                    quantity_sold,
                    sale_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                };
                let err = b.store().record_sale(&sale).await.unwrap_err();
                assert!(
                    matches!(err, StoreError::Rejected(wareflow_core::DomainError::Validation(_))),
                    "{}: {err:?}",
                    b.name()
                );
                assert_eq!(ServiceError::from(err).kind(), crate::error::ErrorKind::Validation);
            }
        }
    }

    #[tokio::test]
    async fn store_reports_unique_violation_when_precheck_is_skipped() {
        for b in with_warehouse().await {
            let plan = widget("W-100", 1).validate().unwrap();
            b.store().create_product_with_stock(&plan).await.unwrap();
            let err = b.store().create_product_with_stock(&plan).await.unwrap_err();
            assert!(matches!(err, StoreError::UniqueViolation(_)), "{}: {err:?}", b.name());
            assert_eq!(b.store().row_counts().await.unwrap().inventory, 1, "{}", b.name());
        }
    }

    #[tokio::test]
    async fn bundles_reject_cycles_and_excess_depth() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let mut ids: Vec<ProductId> = Vec::new();
            for sku in ["K-1", "K-2", "K-3", "K-4"] {
                ids.push(svc.create_product_with_stock(&bundle(sku)).await.unwrap().product.id);
            }
            let composer = BundleComposer::with_max_depth(b.store(), 2);

            composer.add_component(ids[0], ids[1], 2).await.unwrap();
            composer.add_component(ids[1], ids[2], 1).await.unwrap();

            let err = composer.add_component(ids[2], ids[0], 1).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("cycle")), "{}: {err:?}", b.name());

            let err = composer.add_component(ids[2], ids[3], 1).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("depth")), "{}: {err:?}", b.name());

            let err = composer.add_component(ids[0], ids[1], 5).await.unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(_)), "{}: {err:?}", b.name());

            let err = composer.add_component(ids[0], ids[0], 1).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{}: {err:?}", b.name());

            let components = composer.components(ids[0]).await.unwrap();
            assert_eq!(components.len(), 1, "{}", b.name());
            assert_eq!(components[0].quantity, 2, "{}", b.name());
            assert_eq!(b.store().row_counts().await.unwrap().bundle_edges, 2, "{}", b.name());
        }
    }

    #[tokio::test]
    async fn bundle_endpoints_are_checked() {
        for b in with_warehouse().await {
            let svc = ProductOnboarding::new(b.store());
            let plain = svc.create_product_with_stock(&widget("P-1", 1)).await.unwrap().product.id;
            let kit = svc.create_product_with_stock(&bundle("K-1")).await.unwrap().product.id;
            let composer = BundleComposer::new(b.store());

            let err = composer.add_component(plain, kit, 1).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{}: {err:?}", b.name());

            let err = composer.add_component(kit, ProductId::new(404), 1).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)), "{}: {err:?}", b.name());

            let err = composer.add_component(kit, plain, 0).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{}: {err:?}", b.name());

            assert!(composer.components(plain).await.unwrap().is_empty(), "{}", b.name());
            let err = composer.components(ProductId::new(404)).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)), "{}: {err:?}", b.name());
        }
    }

    #[tokio::test]
    async fn demo_dataset_yields_one_widget_alert() {
        let as_of = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        for b in backends().await {
            let demo = seed::seed_demo(b.store()).await.unwrap().unwrap();
            assert!(seed::seed_demo(b.store()).await.unwrap().is_none(), "{}", b.name());

            let report = LowStockAlerts::new(b.store())
                .for_company(demo.company_id, as_of)
                .await
                .unwrap();
            assert_eq!(report.total_alerts, 1, "{}", b.name());

            let alert = &report.alerts[0];
            assert_eq!(alert.product_id, demo.widget_a, "{}", b.name());
            assert_eq!(alert.product_name, "Widget A");
            assert_eq!(alert.sku, "WID-001");
            assert_eq!(alert.warehouse_id, MAIN_WAREHOUSE);
            assert_eq!(alert.warehouse_name, "Main Warehouse");
            assert_eq!(alert.current_stock, 5);
            assert_eq!(alert.threshold, 20);
            assert_eq!(alert.days_until_stockout, 11);
            assert_eq!(alert.supplier.id, Some(SupplierId::new(789)));
            assert_eq!(alert.supplier.name, "Supplier Corp");
            assert_eq!(alert.supplier.contact_email, "orders@supplier.com");
        }
    }

    #[tokio::test]
    async fn alerts_for_unknown_company_are_not_found() {
        for b in backends().await {
            let err = LowStockAlerts::new(b.store())
                .for_company(CompanyId::new(77), NaiveDate::from_ymd_opt(2025, 8, 2).unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)), "{}: {err:?}", b.name());
        }
    }

    #[tokio::test]
    async fn older_sales_fall_out_of_the_window() {
        for b in backends().await {
            let demo = seed::seed_demo(b.store()).await.unwrap().unwrap();
            // Widget A's last sale is 2025-07-28; 30 days later nothing is recent.
            let report = LowStockAlerts::new(b.store())
                .for_company(demo.company_id, NaiveDate::from_ymd_opt(2025, 8, 28).unwrap())
                .await
                .unwrap();
            assert_eq!(report.total_alerts, 0, "{}", b.name());
        }
    }
}
