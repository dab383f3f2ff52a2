use axum::Router;

pub mod companies;
pub mod products;
pub mod system;

/// Router for every `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/companies", companies::router())
}
