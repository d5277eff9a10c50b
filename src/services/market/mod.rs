//! Market data and price forecasting

pub mod forecast;
pub mod indicators;
pub mod scaler;
pub mod yahoo;

use crate::error::ServiceError;
use crate::types::PriceSeries;
use async_trait::async_trait;

pub use forecast::Forecaster;
pub use yahoo::{RetryPolicy, YahooClient};

/// Source of daily OHLCV history.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn daily_history(&self, ticker: &str) -> Result<PriceSeries, ServiceError>;
}
