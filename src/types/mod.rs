pub mod forecast;
pub mod prediction;

pub use forecast::{Direction, ForecastResult, PriceBar, PriceSeries};
pub use prediction::{PredictResponse, PredictionResult, SignAction};
