//! Service wiring: one shared store behind every catalog service.

use std::sync::Arc;

use wareflow_infra::{AppConfig, BundleComposer, CatalogQueries, CatalogStore, LowStockAlerts, ProductOnboarding};

pub type Store = dyn CatalogStore;

#[derive(Clone)]
pub struct AppServices {
    pub onboarding: ProductOnboarding<Store>,
    pub queries: CatalogQueries<Store>,
    pub bundles: BundleComposer<Store>,
    pub alerts: LowStockAlerts<Store>,
}

impl AppServices {
    pub fn new(store: Arc<Store>, max_bundle_depth: usize, alert_window_days: u32) -> Self {
        Self {
            onboarding: ProductOnboarding::new(Arc::clone(&store)),
            queries: CatalogQueries::new(Arc::clone(&store)),
            bundles: BundleComposer::with_max_depth(Arc::clone(&store), max_bundle_depth),
            alerts: LowStockAlerts::with_window(store, alert_window_days),
        }
    }

    pub fn from_config(store: Arc<Store>, config: &AppConfig) -> Self {
        Self::new(store, config.max_bundle_depth, config.alert_window_days)
    }
}
