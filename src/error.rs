//! Request-boundary error taxonomy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Message clients have always received while no model is loaded.
pub const MODEL_LOADING_MESSAGE: &str = "Model loading...";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("{model} model unavailable: {reason}")]
    ModelUnavailable { model: &'static str, reason: String },

    #[error("insufficient market data for {ticker}: got {available} rows, need {required}")]
    InsufficientData {
        ticker: String,
        available: usize,
        required: usize,
    },

    #[error("market data fetch failed: {0}")]
    ExternalFetch(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload too large: {0}")]
    PayloadTooLarge(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Degraded mode is reported in-band.
            ServiceError::ModelUnavailable { .. } => StatusCode::OK,
            ServiceError::Decode(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ExternalFetch(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Decode(_) => "decode",
            ServiceError::ModelUnavailable { .. } => "model_unavailable",
            ServiceError::InsufficientData { .. } => "insufficient_data",
            ServiceError::ExternalFetch(_) => "external_fetch",
            ServiceError::Inference(_) => "inference",
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::PayloadTooLarge(_) => "payload_too_large",
        }
    }
}

impl From<candle_core::Error> for ServiceError {
    fn from(err: candle_core::Error) -> Self {
        ServiceError::Inference(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            ServiceError::Inference("inference task panicked".to_string())
        } else {
            ServiceError::Inference(err.to_string())
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let message = match &self {
            ServiceError::ModelUnavailable { .. } => MODEL_LOADING_MESSAGE.to_string(),
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
