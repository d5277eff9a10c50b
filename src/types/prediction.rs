use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one classification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub class_id: u32,
    pub confidence: f32,
    pub critical: bool,
    pub action: SignAction,
}

impl PredictionResult {
    /// Confidence as shown to clients, e.g. `"97.31%"`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

/// What a driver-assist consumer should do with the recognised sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignAction {
    #[serde(rename = "CRITICAL STOP")]
    CriticalStop,
    #[serde(rename = "SPEED LIMIT")]
    SpeedLimit,
    #[serde(rename = "NO ENTRY")]
    NoEntry,
    #[serde(rename = "NAVIGATE")]
    Navigate,
    #[serde(rename = "PROCEED")]
    Proceed,
}

impl SignAction {
    /// Checked in order; first match wins.
    pub fn for_label(label: &str) -> Self {
        if label.contains("Stop") {
            SignAction::CriticalStop
        } else if label.contains("Speed") {
            SignAction::SpeedLimit
        } else if label.contains("No entry") {
            SignAction::NoEntry
        } else if label.contains("Turn") {
            SignAction::Navigate
        } else {
            SignAction::Proceed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignAction::CriticalStop => "CRITICAL STOP",
            SignAction::SpeedLimit => "SPEED LIMIT",
            SignAction::NoEntry => "NO ENTRY",
            SignAction::Navigate => "NAVIGATE",
            SignAction::Proceed => "PROCEED",
        }
    }
}

impl fmt::Display for SignAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub sign_class: String,
    pub confidence: String,
    pub class_id: u32,
    pub critical: bool,
    pub action: SignAction,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            confidence: result.confidence_percent(),
            sign_class: result.label,
            class_id: result.class_id,
            critical: result.critical,
            action: result.action,
        }
    }
}
