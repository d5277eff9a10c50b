use crate::config::Config;
use crate::error::ServiceError;
use crate::services::market::{Forecaster, MarketDataSource, RetryPolicy, YahooClient};
use crate::services::ml::{ClassLabelTable, ModelLoader, SignClassifier};
use crate::services::MetricsService;
use anyhow::Result;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// A model that either loaded at startup or never will.
pub enum ModelSlot<T> {
    Ready(Arc<T>),
    Unavailable { reason: String },
}

impl<T> ModelSlot<T> {
    pub fn ready(model: T) -> Self {
        ModelSlot::Ready(Arc::new(model))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelSlot::Unavailable {
            reason: reason.into(),
        }
    }

    /// Log the outcome of a load attempt and keep whichever side it produced.
    pub fn from_load<E: Display>(name: &str, result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(model) => {
                tracing::info!("[STATE] ✅ {} model loaded successfully", name);
                Self::ready(model)
            }
            Err(e) => {
                tracing::error!("[STATE] ⚠️ {} model loading failed: {}", name, e);
                tracing::info!("[STATE] 🌐 Server will answer {} requests in degraded mode", name);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn get(&self, name: &'static str) -> std::result::Result<&Arc<T>, ServiceError> {
        match self {
            ModelSlot::Ready(model) => Ok(model),
            ModelSlot::Unavailable { reason } => Err(ServiceError::ModelUnavailable {
                model: name,
                reason: reason.clone(),
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            ModelSlot::Ready(_) => None,
            ModelSlot::Unavailable { reason } => Some(reason),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub classifier: Arc<ModelSlot<SignClassifier>>,
    pub forecaster: Arc<ModelSlot<Forecaster>>,
    pub market: Arc<dyn MarketDataSource>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    /// Load every model once. Missing artifacts leave the slot unavailable;
    /// only configuration errors abort startup.
    pub fn new(config: Config) -> Result<Self> {
        tracing::info!("[STATE] Initializing AppState...");
        tracing::info!("[STATE]   Classifier candidates: {:?}", config.classifier_paths);
        tracing::info!("[STATE]   Forecast candidates: {:?}", config.forecast_paths);
        tracing::info!("[STATE]   Device: {:?}", config.device);

        let labels = match &config.labels_path {
            Some(path) => {
                tracing::info!("[STATE] Label table: {}", path.display());
                ClassLabelTable::from_file(path)?
            }
            None => ClassLabelTable::gtsrb()?,
        };
        let labels = Arc::new(labels);

        let device = config.to_candle_device();

        let classifier = ModelSlot::from_load(
            "classifier",
            ModelLoader::load_classifier(&config.classifier_paths, &device)
                .map(|model| SignClassifier::new(Arc::new(model), labels.clone())),
        );
        let forecaster = ModelSlot::from_load(
            "forecast",
            ModelLoader::load_forecaster(&config.forecast_paths, &device)
                .map(|model| Forecaster::new(Arc::new(model))),
        );

        let market = YahooClient::new(
            config.market_data_url.clone(),
            config.history_range.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
            RetryPolicy {
                max_retries: config.fetch_retries,
                ..RetryPolicy::default()
            },
        )?;

        Ok(Self::from_parts(config, classifier, forecaster, Arc::new(market)))
    }

    pub fn from_parts(
        config: Config,
        classifier: ModelSlot<SignClassifier>,
        forecaster: ModelSlot<Forecaster>,
        market: Arc<dyn MarketDataSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
            forecaster: Arc::new(forecaster),
            market,
            metrics: Arc::new(MetricsService::new()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.classifier.is_ready() || !self.forecaster.is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_models_start_degraded() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let config = Config::from_lookup(|key| match key {
            "CLASSIFIER_MODEL_PATHS" => Some(dir.path().join("none.safetensors").display().to_string()),
            "FORECAST_MODEL_PATHS" => Some(dir.path().join("none2.safetensors").display().to_string()),
            _ => None,
        })?;

        let state = AppState::new(config)?;
        assert!(state.is_degraded());
        assert!(state
            .classifier
            .unavailable_reason()
            .is_some_and(|r| r.contains("none.safetensors")));

        let err = state.forecaster.get("forecast").err();
        assert!(matches!(err, Some(ServiceError::ModelUnavailable { model: "forecast", .. })));
        Ok(())
    }

    #[test]
    fn test_broken_label_file_aborts_startup() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let labels = dir.path().join("labels.json");
        std::fs::write(&labels, "{not json")?;
        let labels_str = labels.display().to_string();

        let config = Config::from_lookup(|key| match key {
            "LABELS_PATH" => Some(labels_str.clone()),
            _ => None,
        })?;
        assert!(AppState::new(config).is_err());
        Ok(())
    }
}
