use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,

    // Model configuration
    pub classifier_paths: Vec<PathBuf>,
    pub forecast_paths: Vec<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub device: DeviceConfig,

    // Market data
    pub market_data_url: String,
    pub history_range: String,
    pub fetch_timeout_secs: u64,
    pub fetch_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceConfig {
    Cpu,
    Cuda(usize),
    Metal,
}

impl DeviceConfig {
    fn parse(value: &str) -> anyhow::Result<Self> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "cpu" => Ok(DeviceConfig::Cpu),
            "metal" => Ok(DeviceConfig::Metal),
            "cuda" => Ok(DeviceConfig::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(idx) => Ok(DeviceConfig::Cuda(idx.parse()?)),
                None => anyhow::bail!("unknown device '{}'", other),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            host: var("HOST", "127.0.0.1"),
            port: var("PORT", "8000").parse()?,
            max_upload_bytes: var("MAX_UPLOAD_BYTES", "10485760").parse()?,

            classifier_paths: path_list(&var(
                "CLASSIFIER_MODEL_PATHS",
                "traffic_classifier.safetensors,backend/traffic_classifier.safetensors,models/traffic_classifier.safetensors",
            )),
            forecast_paths: path_list(&var(
                "FORECAST_MODEL_PATHS",
                "stock_model.safetensors,backend/stock_model.safetensors,models/stock_model.safetensors",
            )),
            labels_path: lookup("LABELS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            device: DeviceConfig::parse(&var("DEVICE", "cpu"))?,

            market_data_url: var("MARKET_DATA_URL", "https://query1.finance.yahoo.com"),
            history_range: var("MARKET_HISTORY_RANGE", "2y"),
            fetch_timeout_secs: var("MARKET_FETCH_TIMEOUT_SECS", "10").parse()?,
            fetch_retries: var("MARKET_FETCH_RETRIES", "2").parse()?,
        })
    }

    pub fn to_candle_device(&self) -> candle_core::Device {
        match &self.device {
            DeviceConfig::Cpu => candle_core::Device::Cpu,
            DeviceConfig::Cuda(idx) => {
                candle_core::Device::new_cuda(*idx).unwrap_or(candle_core::Device::Cpu)
            }
            DeviceConfig::Metal => {
                candle_core::Device::new_metal(0).unwrap_or(candle_core::Device::Cpu)
            }
        }
    }
}

fn path_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
