use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use wareflow_catalog::CreateProductRequest;
use wareflow_core::{DomainError, ProductId, WarehouseId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", get(get_product))
        .route("/:id/stock/:warehouse_id", get(get_stock))
        .route("/:id/components", post(add_component).get(list_components))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.onboarding.create_product_with_stock(&body).await {
        Ok(onboarded) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Product created",
                "product_id": onboarded.product.id,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.queries.product(id).await {
        Ok(details) => Json(dto::product_details_to_json(&details)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, warehouse_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (id, warehouse_id): (ProductId, WarehouseId) = match (dto::parse_id(&id), dto::parse_id(&warehouse_id)) {
        (Ok(p), Ok(w)) => (p, w),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match services.queries.stock_level(id, warehouse_id).await {
        Ok(quantity) => Json(serde_json::json!({
            "product_id": id,
            "warehouse_id": warehouse_id,
            "quantity": quantity.get(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_component(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::AddComponentRequest>, JsonRejection>,
) -> axum::response::Response {
    let bundle_id: ProductId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let Some(component_id) = body.component_id else {
        return errors::service_error_to_response(DomainError::validation("component_id is required").into());
    };

    match services
        .bundles
        .add_component(bundle_id, ProductId::new(component_id), body.quantity.unwrap_or(1))
        .await
    {
        Ok(edge) => (StatusCode::CREATED, Json(dto::component_to_json(&edge))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_components(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let bundle_id: ProductId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.bundles.components(bundle_id).await {
        Ok(components) => Json(serde_json::json!({
            "bundle_id": bundle_id,
            "components": components.iter().map(dto::component_to_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
