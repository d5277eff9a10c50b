//! Model manifests stored next to each weights file
//!
//! `traffic_classifier.safetensors` is paired with `traffic_classifier.json`.
//! The manifest names the network kind, the hyper-parameters needed to
//! rebuild it, and (for image models) the preprocessing the weights were
//! trained under.

use serde::{Deserialize, Serialize};

/// How an image must be prepared before it reaches a given model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessContract {
    pub version: String,
    pub width: u32,
    pub height: u32,
    /// Divide pixel intensities by 255.
    pub normalize: bool,
}

impl PreprocessContract {
    /// 30×30 RGB scaled to [0,1].
    pub fn rgb30_unit() -> Self {
        Self {
            version: "gtsrb-rgb30-unit/v1".to_string(),
            width: 30,
            height: 30,
            normalize: true,
        }
    }

    /// 60×60 RGB scaled to [0,1].
    pub fn rgb60_unit() -> Self {
        Self {
            version: "gtsrb-rgb60-unit/v2".to_string(),
            width: 60,
            height: 60,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelManifest {
    TrafficSignCnn(CnnManifest),
    PriceLstm(LstmManifest),
}

impl ModelManifest {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelManifest::TrafficSignCnn(_) => "traffic_sign_cnn",
            ModelManifest::PriceLstm(_) => "price_lstm",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnnManifest {
    pub preprocess: PreprocessContract,
    pub num_classes: usize,
    /// Output channels of each conv block, in order.
    pub conv_filters: Vec<usize>,
    pub dense_units: usize,
    #[serde(default = "default_batch_norm_eps")]
    pub batch_norm_eps: f64,
}

fn default_batch_norm_eps() -> f64 {
    1e-3
}

impl CnnManifest {
    /// Architecture of the 60×60 four-block network.
    pub fn gtsrb_v2() -> Self {
        Self {
            preprocess: PreprocessContract::rgb60_unit(),
            num_classes: 43,
            conv_filters: vec![32, 64, 128, 256],
            dense_units: 512,
            batch_norm_eps: default_batch_norm_eps(),
        }
    }

    /// Architecture of the 30×30 three-block network.
    pub fn gtsrb_v1() -> Self {
        Self {
            preprocess: PreprocessContract::rgb30_unit(),
            num_classes: 43,
            conv_filters: vec![32, 64, 128],
            dense_units: 512,
            batch_norm_eps: default_batch_norm_eps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmManifest {
    /// Number of time steps the model consumes.
    pub window: usize,
    pub lstm_units: Vec<usize>,
    #[serde(default)]
    pub dense_units: Vec<usize>,
}

impl LstmManifest {
    pub fn default_stock() -> Self {
        Self {
            window: 60,
            lstm_units: vec![50, 50],
            dense_units: vec![25],
        }
    }
}
