pub mod market;
pub mod metrics;
pub mod ml;

pub use market::{Forecaster, MarketDataSource};
pub use metrics::MetricsService;
pub use ml::{ClassLabelTable, SignClassifier};
