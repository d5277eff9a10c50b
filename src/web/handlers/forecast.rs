//! Price forecast endpoint

use crate::error::ServiceError;
use crate::services::market::forecast::validate_ticker;
use crate::services::metrics::Pipeline;
use crate::state::AppState;
use crate::types::ForecastResult;
use axum::{
    extract::{Path, State},
    response::Json,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// `GET /forecast/{ticker}`
pub async fn forecast_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ForecastResult>, ServiceError> {
    let request_id = Uuid::now_v7();
    let started = Instant::now();

    let result = run_forecast(&state, &ticker)
        .instrument(tracing::info_span!("forecast", %request_id, %ticker))
        .await;

    state
        .metrics
        .record(Pipeline::Forecast, started.elapsed(), result.is_ok());

    match result {
        Ok(forecast) => {
            tracing::info!(
                "[{}] {} {:.2} → {:.2} in {:?}",
                request_id,
                forecast.ticker,
                forecast.current_price,
                forecast.predicted_price,
                started.elapsed()
            );
            Ok(Json(forecast))
        }
        Err(e) => {
            tracing::warn!("[{}] forecast failed ({}): {}", request_id, e.kind(), e);
            Err(e)
        }
    }
}

async fn run_forecast(state: &AppState, ticker: &str) -> Result<ForecastResult, ServiceError> {
    let forecaster = state.forecaster.get("forecast")?;
    let ticker = validate_ticker(ticker)?;
    forecaster.forecast(state.market.as_ref(), &ticker).await
}
