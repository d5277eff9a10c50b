//! Yahoo Finance chart API client

use super::MarketDataSource;
use crate::error::ServiceError;
use crate::types::{PriceBar, PriceSeries};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Retries transport failures and 5xx responses with linear backoff.
/// Any other non-success status fails on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

pub struct YahooClient {
    base_url: String,
    range: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new(
        base_url: impl Into<String>,
        range: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            range: range.into(),
            retry,
            client,
        })
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval=1d&range={}",
            self.base_url, ticker, self.range
        )
    }

    async fn fetch_body(&self, url: &str) -> Result<String, ServiceError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.client.get(url).send().await;

            let retryable = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| ServiceError::ExternalFetch(e.to_string()));
                    }
                    if !status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(ServiceError::ExternalFetch(describe_failure(status, &body)));
                    }
                    format!("HTTP {status}")
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => e.to_string(),
                Err(e) => return Err(ServiceError::ExternalFetch(e.to_string())),
            };

            if attempt > self.retry.max_retries {
                return Err(ServiceError::ExternalFetch(format!(
                    "giving up after {attempt} attempts: {retryable}"
                )));
            }
            tracing::warn!(
                "⚠️ Market data attempt {} failed ({}), retrying",
                attempt,
                retryable
            );
            tokio::time::sleep(self.retry.backoff * attempt).await;
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn daily_history(&self, ticker: &str) -> Result<PriceSeries, ServiceError> {
        let url = self.chart_url(ticker);
        tracing::info!("Fetching market data from: {}", url);

        let body = self.fetch_body(&url).await?;
        let series = parse_chart(ticker, &body)?;

        tracing::info!("Fetched {} data points for {}", series.len(), ticker);
        Ok(series)
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<YahooResponse>(body) {
        Ok(YahooResponse {
            chart: ChartResult {
                error: Some(error), ..
            },
        }) => format!("HTTP {status}: {} - {}", error.code, error.description),
        _ => format!("HTTP {status}"),
    }
}

/// Turn a chart payload into bars, dropping rows with any missing field.
pub fn parse_chart(ticker: &str, body: &str) -> Result<PriceSeries, ServiceError> {
    let response: YahooResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::ExternalFetch(format!("failed to parse response: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(ServiceError::ExternalFetch(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ServiceError::ExternalFetch("no data in response".to_string()))?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::ExternalFetch("no quote data".to_string()))?;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |column: &[Option<f64>]| column.get(i).copied().flatten();
        let row = (
            Utc.timestamp_opt(ts, 0).single(),
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            field(&quote.volume),
        );
        if let (Some(timestamp), Some(open), Some(high), Some(low), Some(close), Some(volume)) = row {
            bars.push(PriceBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }

    Ok(PriceSeries::new(ticker, bars))
}
