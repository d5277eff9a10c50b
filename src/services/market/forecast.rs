//! Next-close forecast: scale → last window → model → inverse scale

use super::indicators::{rsi, sma};
use super::scaler::MinMaxScaler;
use super::MarketDataSource;
use crate::error::ServiceError;
use crate::services::ml::SequenceRegressor;
use crate::types::{Direction, ForecastResult, PriceSeries};
use candle_core::Tensor;
use std::sync::Arc;

pub const SMA_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;

pub struct Forecaster {
    model: Arc<dyn SequenceRegressor>,
    sma_period: usize,
    rsi_period: usize,
}

impl Forecaster {
    pub fn new(model: Arc<dyn SequenceRegressor>) -> Self {
        Self {
            model,
            sma_period: SMA_PERIOD,
            rsi_period: RSI_PERIOD,
        }
    }

    pub fn window(&self) -> usize {
        self.model.window()
    }

    /// Fetch the history, then run the pipeline on the blocking pool.
    pub async fn forecast(
        self: &Arc<Self>,
        source: &dyn MarketDataSource,
        ticker: &str,
    ) -> Result<ForecastResult, ServiceError> {
        let series = source.daily_history(ticker).await?;
        let forecaster = Arc::clone(self);
        tokio::task::spawn_blocking(move || forecaster.forecast_series(&series)).await?
    }

    pub fn forecast_series(&self, series: &PriceSeries) -> Result<ForecastResult, ServiceError> {
        let window = self.model.window();
        if series.len() < window {
            return Err(ServiceError::InsufficientData {
                ticker: series.ticker.clone(),
                available: series.len(),
                required: window,
            });
        }

        let closes = series.closes();
        let latest = match series.latest() {
            Some(bar) => bar,
            None => {
                return Err(ServiceError::InsufficientData {
                    ticker: series.ticker.clone(),
                    available: 0,
                    required: window,
                })
            }
        };

        let scaler = MinMaxScaler::fit(&closes).ok_or_else(|| {
            ServiceError::ExternalFetch(format!("non-finite prices for {}", series.ticker))
        })?;
        let scaled: Vec<f32> = scaler
            .transform_all(&closes[closes.len() - window..])
            .into_iter()
            .map(|v| v as f32)
            .collect();

        let input = Tensor::from_vec(scaled, (1, window, 1), self.model.device())?;
        let output = self.model.predict(&input)?.flatten_all()?.to_vec1::<f32>()?;
        let scaled_prediction = match output.first() {
            Some(v) if v.is_finite() => *v as f64,
            _ => return Err(ServiceError::Inference("model returned no finite value".to_string())),
        };

        let current_price = latest.close;
        let predicted_price = scaler.inverse(scaled_prediction);
        let percent_change = if current_price != 0.0 {
            (predicted_price - current_price) / current_price * 100.0
        } else {
            0.0
        };
        let direction = Direction::from_prices(current_price, predicted_price);

        tracing::debug!(
            "{}: close {:.2} → predicted {:.2} ({:+.2}%, {:?})",
            series.ticker,
            current_price,
            predicted_price,
            percent_change,
            direction
        );

        Ok(ForecastResult {
            ticker: series.ticker.clone(),
            as_of: latest.timestamp,
            current_price,
            predicted_price,
            percent_change,
            volume: latest.volume,
            moving_average: sma(&closes, self.sma_period),
            rsi: rsi(&closes, self.rsi_period),
            direction,
        })
    }
}

/// Ticker symbols accepted by the forecast route.
pub fn validate_ticker(ticker: &str) -> Result<String, ServiceError> {
    let ticker = ticker.trim();
    let valid = !ticker.is_empty()
        && ticker.len() <= 15
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(ticker.to_ascii_uppercase())
    } else {
        Err(ServiceError::BadRequest(format!("invalid ticker '{ticker}'")))
    }
}
