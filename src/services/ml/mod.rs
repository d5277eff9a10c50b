//! Machine learning services

pub mod classifier;
pub mod labels;
pub mod loader;
pub mod manifest;
pub mod preprocess;
pub mod price_lstm;
pub mod traffic_net;

pub use classifier::{ImageClassifier, SignClassifier};
pub use labels::ClassLabelTable;
pub use loader::{LoadError, ModelLoader};
pub use manifest::{ModelManifest, PreprocessContract};
pub use price_lstm::{PriceLstm, SequenceRegressor};
pub use traffic_net::TrafficSignNet;
