//! Health check endpoint

use crate::services::metrics::MetricsStats;
use crate::state::{AppState, ModelSlot};
use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<String>,
}

impl ModelStatus {
    fn of<T>(slot: &ModelSlot<T>, preprocess: Option<String>) -> Self {
        Self {
            ready: slot.is_ready(),
            reason: slot.unavailable_reason().map(str::to_string),
            preprocess,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Models {
    pub classifier: ModelStatus,
    pub forecast: ModelStatus,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub models: Models,
    pub metrics: MetricsStats,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let preprocess = match state.classifier.as_ref() {
        ModelSlot::Ready(classifier) => Some(classifier.contract().version.clone()),
        ModelSlot::Unavailable { .. } => None,
    };

    let report = HealthReport {
        status: if state.is_degraded() { "degraded" } else { "healthy" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        models: Models {
            classifier: ModelStatus::of(&*state.classifier, preprocess),
            forecast: ModelStatus::of(&*state.forecaster, None),
        },
        metrics: state.metrics.get_stats(),
    };

    (StatusCode::OK, Json(report))
}
