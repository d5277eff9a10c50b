//! HTTP-level tests for the predict, forecast and health routes
//!
//! Models and market data are replaced by in-process fakes so the full
//! router, extractors and error mapping run without artifacts or network.

use apex_vision::{
    config::Config,
    services::ml::{ClassLabelTable, ImageClassifier, PreprocessContract, SequenceRegressor},
    types::{PriceBar, PriceSeries},
    web::create_app,
    AppState, Forecaster, MarketDataSource, ModelSlot, ServiceError, SignClassifier,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use candle_core::{Device, Tensor};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Test Fixtures
// ============================================================================

const BOUNDARY: &str = "apex-vision-test-boundary";

/// Scores one class at `confidence` and spreads the rest evenly.
struct OneHotClassifier {
    contract: PreprocessContract,
    class_id: usize,
    confidence: f32,
    device: Device,
}

impl OneHotClassifier {
    fn new(class_id: usize, confidence: f32) -> Self {
        Self {
            contract: PreprocessContract::rgb60_unit(),
            class_id,
            confidence,
            device: Device::Cpu,
        }
    }
}

impl ImageClassifier for OneHotClassifier {
    fn contract(&self) -> &PreprocessContract {
        &self.contract
    }

    fn num_classes(&self) -> usize {
        43
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, input: &Tensor) -> candle_core::Result<Tensor> {
        assert_eq!(input.dims(), &[1, 60, 60, 3]);
        let rest = (1.0 - self.confidence) / 42.0;
        let mut scores = vec![rest; 43];
        scores[self.class_id] = self.confidence;
        Tensor::from_vec(scores, (1, 43), &self.device)
    }
}

/// Returns the middle of the fitted range for any window.
struct MidpointRegressor {
    device: Device,
}

impl SequenceRegressor for MidpointRegressor {
    fn window(&self) -> usize {
        60
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, _input: &Tensor) -> candle_core::Result<Tensor> {
        Tensor::from_vec(vec![0.5f32], (1, 1), &self.device)
    }
}

struct StaticSource(PriceSeries);

#[async_trait]
impl MarketDataSource for StaticSource {
    async fn daily_history(&self, ticker: &str) -> Result<PriceSeries, ServiceError> {
        let mut series = self.0.clone();
        series.ticker = ticker.to_string();
        Ok(series)
    }
}

struct FailingSource;

#[async_trait]
impl MarketDataSource for FailingSource {
    async fn daily_history(&self, _ticker: &str) -> Result<PriceSeries, ServiceError> {
        Err(ServiceError::ExternalFetch("HTTP 503 Service Unavailable".to_string()))
    }
}

fn series(closes: &[f64]) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 5_000.0,
        })
        .collect();
    PriceSeries::new("TEST", bars)
}

fn default_config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

fn ready_app(class_id: usize, confidence: f32, market: Arc<dyn MarketDataSource>) -> Router {
    ready_app_with_config(default_config(), class_id, confidence, market)
}

fn ready_app_with_config(
    config: Config,
    class_id: usize,
    confidence: f32,
    market: Arc<dyn MarketDataSource>,
) -> Router {
    let labels = Arc::new(ClassLabelTable::gtsrb().unwrap());
    let classifier = SignClassifier::new(Arc::new(OneHotClassifier::new(class_id, confidence)), labels);
    let forecaster = Forecaster::new(Arc::new(MidpointRegressor { device: Device::Cpu }));

    create_app(AppState::from_parts(
        config,
        ModelSlot::ready(classifier),
        ModelSlot::ready(forecaster),
        market,
    ))
}

fn degraded_app() -> Router {
    create_app(AppState::from_parts(
        default_config(),
        ModelSlot::unavailable("no model artifact found"),
        ModelSlot::unavailable("no model artifact found"),
        Arc::new(FailingSource),
    ))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 20, 30]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_request(field: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"sign.png\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// /predict
// ============================================================================

#[tokio::test]
async fn test_predict_stop_sign() {
    let app = ready_app(14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, multipart_request("file", &png_bytes(500, 500))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sign_class"], "Stop");
    assert_eq!(json["confidence"], "97.00%");
    assert_eq!(json["class_id"], 14);
    assert_eq!(json["critical"], true);
    assert_eq!(json["action"], "CRITICAL STOP");
}

#[tokio::test]
async fn test_predict_non_critical_sign() {
    let app = ready_app(1, 0.8, Arc::new(FailingSource));
    let (status, json) = send(app, multipart_request("file", &png_bytes(32, 48))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sign_class"], "Speed limit (30km/h)");
    assert_eq!(json["critical"], false);
}

#[tokio::test]
async fn test_predict_degraded_answers_model_loading() {
    let (status, json) = send(degraded_app(), multipart_request("file", &png_bytes(60, 60))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "error": "Model loading..." }));
}

#[tokio::test]
async fn test_predict_missing_file_field() {
    let app = ready_app(14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, multipart_request("image", &png_bytes(60, 60))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_predict_upload_over_limit() {
    let config = Config::from_lookup(|key| match key {
        "MAX_UPLOAD_BYTES" => Some("1024".to_string()),
        _ => None,
    })
    .unwrap();
    let app = ready_app_with_config(config, 14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, multipart_request("file", &vec![7u8; 8 * 1024])).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_predict_undecodable_upload() {
    let app = ready_app(14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, multipart_request("file", b"definitely not an image")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ============================================================================
// /forecast/{ticker}
// ============================================================================

#[tokio::test]
async fn test_forecast_returns_prediction_and_indicators() {
    let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
    let app = ready_app(14, 0.97, Arc::new(StaticSource(series(&closes))));
    let (status, json) = send(app, get("/forecast/aapl")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ticker"], "AAPL");
    assert_eq!(json["current_price"], 199.0);
    // min 100, max 199 → 0.5 maps to 149.5
    assert!((json["predicted_price"].as_f64().unwrap() - 149.5).abs() < 1e-6);
    assert_eq!(json["direction"], "bearish");
    assert_eq!(json["moving_average"].as_array().unwrap().len(), 100);
    assert_eq!(json["rsi"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_forecast_insufficient_history() {
    let app = ready_app(14, 0.97, Arc::new(StaticSource(series(&[10.0; 30]))));
    let (status, json) = send(app, get("/forecast/IPO")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("need 60"));
}

#[tokio::test]
async fn test_forecast_invalid_ticker() {
    let app = ready_app(14, 0.97, Arc::new(StaticSource(series(&[10.0; 80]))));
    let (status, _) = send(app, get("/forecast/BAD!TICKER")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_upstream_failure() {
    let app = ready_app(14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, get("/forecast/MSFT")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_forecast_degraded_answers_model_loading() {
    let (status, json) = send(degraded_app(), get("/forecast/MSFT")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], "Model loading...");

    // Availability is reported before the ticker is looked at.
    let (status, json) = send(degraded_app(), get("/forecast/BAD!TICKER")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], "Model loading...");
}

// ============================================================================
// /health
// ============================================================================

#[tokio::test]
async fn test_health_ready() {
    let app = ready_app(14, 0.97, Arc::new(FailingSource));
    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["models"]["classifier"]["ready"], true);
    assert_eq!(json["models"]["classifier"]["preprocess"], "gtsrb-rgb60-unit/v2");
    assert_eq!(json["models"]["forecast"]["ready"], true);
}

#[tokio::test]
async fn test_health_degraded() {
    let (status, json) = send(degraded_app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["models"]["classifier"]["ready"], false);
    assert!(json["models"]["classifier"]["reason"]
        .as_str()
        .unwrap()
        .contains("no model artifact"));
    assert_eq!(json["metrics"]["classify"]["requests"], 0);
}
