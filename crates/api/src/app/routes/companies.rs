use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDate, Utc};

use wareflow_core::CompanyId;
use wareflow_infra::ErrorKind;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/:company_id/alerts/low-stock", get(low_stock_alerts))
}

pub async fn low_stock_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(company_id): Path<String>,
    query: Result<Query<dto::LowStockQuery>, QueryRejection>,
) -> axum::response::Response {
    let company_id: CompanyId = match dto::parse_id(&company_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let as_of = match query.as_of.as_deref() {
        None => Utc::now().date_naive(),
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    ErrorKind::Validation.as_str(),
                    format!("as_of must be YYYY-MM-DD: {e}"),
                );
            }
        },
    };

    match services.alerts.for_company(company_id, as_of).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
