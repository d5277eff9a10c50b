//! Traffic-sign classification endpoint

use crate::error::ServiceError;
use crate::services::metrics::Pipeline;
use crate::state::AppState;
use crate::types::PredictResponse;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

const FILE_FIELD: &str = "file";

/// `POST /predict` with the image in multipart field `file`.
pub async fn predict_sign(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, ServiceError> {
    let request_id = Uuid::now_v7();
    let started = Instant::now();

    let result = classify_upload(&state, multipart)
        .instrument(tracing::info_span!("predict", %request_id))
        .await;

    state
        .metrics
        .record(Pipeline::Classify, started.elapsed(), result.is_ok());

    match result {
        Ok(response) => {
            tracing::info!(
                "[{}] {} ({}) in {:?}",
                request_id,
                response.sign_class,
                response.confidence,
                started.elapsed()
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::warn!("[{}] classification failed ({}): {}", request_id, e.kind(), e);
            Err(e)
        }
    }
}

async fn classify_upload(
    state: &AppState,
    multipart: Multipart,
) -> Result<PredictResponse, ServiceError> {
    let classifier = Arc::clone(state.classifier.get("classifier")?);
    let bytes = read_file_field(multipart).await?;
    tracing::debug!("Received {} bytes", bytes.len());

    let result = tokio::task::spawn_blocking(move || classifier.classify(&bytes)).await??;
    Ok(result.into())
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() == Some(FILE_FIELD) {
            return field.bytes().await.map_err(multipart_error);
        }
    }
    Err(ServiceError::BadRequest(format!(
        "missing multipart field '{FILE_FIELD}'"
    )))
}

/// Keep the body-limit rejection distinct from malformed multipart input.
fn multipart_error(err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(err.body_text())
    } else {
        ServiceError::BadRequest(err.body_text())
    }
}
