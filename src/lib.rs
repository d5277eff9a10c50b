// Core modules
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod types;
pub mod web;

// Re-exports
pub use error::ServiceError;
pub use services::{Forecaster, MarketDataSource, SignClassifier};
pub use state::{AppState, ModelSlot};
