use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Dashboards are served from a different origin than the API.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
