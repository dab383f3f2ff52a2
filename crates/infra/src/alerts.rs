//! Low-stock report for one company.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::instrument;

use wareflow_catalog::{LowStockAlert, evaluate_low_stock};
use wareflow_core::CompanyId;

use crate::config::DEFAULT_ALERT_WINDOW_DAYS;
use crate::error::ServiceError;
use crate::store::CatalogStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockReport {
    pub alerts: Vec<LowStockAlert>,
    pub total_alerts: usize,
}

#[derive(Debug)]
pub struct LowStockAlerts<S: ?Sized> {
    store: Arc<S>,
    window_days: u32,
}

impl<S: ?Sized> Clone for LowStockAlerts<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            window_days: self.window_days,
        }
    }
}

impl<S> LowStockAlerts<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_window(store, DEFAULT_ALERT_WINDOW_DAYS)
    }

    pub fn with_window(store: Arc<S>, window_days: u32) -> Self {
        Self {
            store,
            window_days: window_days.max(1),
        }
    }

    /// Alerts for `company_id` based on sales in the window ending at `as_of`.
    #[instrument(skip(self), fields(window_days = self.window_days), err)]
    pub async fn for_company(&self, company_id: CompanyId, as_of: NaiveDate) -> Result<LowStockReport, ServiceError> {
        if !self.store.company_exists(company_id).await? {
            return Err(ServiceError::NotFound(format!("company {company_id} not found")));
        }

        let since = as_of
            .checked_sub_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(NaiveDate::MIN);
        let candidates = self.store.low_stock_candidates(company_id, since).await?;
        let alerts = evaluate_low_stock(candidates, self.window_days);

        tracing::debug!(alerts = alerts.len(), %since, "low-stock report built");
        Ok(LowStockReport {
            total_alerts: alerts.len(),
            alerts,
        })
    }
}
