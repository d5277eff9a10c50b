use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // Inference
        .route("/predict", post(super::handlers::predict::predict_sign))
        .route("/forecast/{ticker}", get(super::handlers::forecast::forecast_ticker))
        
        // Health check
        .route("/health", get(super::handlers::health::health_check))
        
        .with_state(state)
}
