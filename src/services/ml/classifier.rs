//! Sign classification: preprocess → forward pass → arg-max → label

use super::labels::ClassLabelTable;
use super::manifest::PreprocessContract;
use super::preprocess;
use crate::error::ServiceError;
use crate::types::prediction::{PredictionResult, SignAction};
use candle_core::{Device, Tensor};
use std::sync::Arc;

/// Class ids that put the result into the critical presentation state.
pub const CRITICAL_CLASS_IDS: [u32; 2] = [14, 17];

pub fn is_critical(class_id: u32) -> bool {
    CRITICAL_CLASS_IDS.contains(&class_id)
}

/// A loaded image model. Implementations are shared read-only across requests.
pub trait ImageClassifier: Send + Sync {
    /// Preprocessing the weights were trained under.
    fn contract(&self) -> &PreprocessContract;

    fn num_classes(&self) -> usize;

    fn device(&self) -> &Device;

    /// `(1, H, W, 3)` input → `(1, num_classes)` scores.
    fn predict(&self, input: &Tensor) -> candle_core::Result<Tensor>;
}

pub struct SignClassifier {
    model: Arc<dyn ImageClassifier>,
    labels: Arc<ClassLabelTable>,
}

impl SignClassifier {
    pub fn new(model: Arc<dyn ImageClassifier>, labels: Arc<ClassLabelTable>) -> Self {
        let coverage = labels.coverage(model.num_classes());
        if !coverage.is_complete() {
            tracing::warn!(
                "⚠️ Label table misses class ids {:?}; they will be reported as '{}'",
                coverage.missing,
                labels.fallback()
            );
        }
        if !coverage.unreachable.is_empty() {
            tracing::debug!("Label ids {:?} are outside the model output", coverage.unreachable);
        }
        Self { model, labels }
    }

    pub fn contract(&self) -> &PreprocessContract {
        self.model.contract()
    }

    /// Classify raw upload bytes.
    pub fn classify(&self, bytes: &[u8]) -> Result<PredictionResult, ServiceError> {
        let input = preprocess::preprocess(bytes, self.model.contract(), self.model.device())?;
        self.classify_tensor(&input)
    }

    pub fn classify_tensor(&self, input: &Tensor) -> Result<PredictionResult, ServiceError> {
        let output = self.model.predict(input)?;
        let scores = output.flatten_all()?.to_vec1::<f32>()?;

        let expected = self.model.num_classes();
        if scores.len() != expected {
            return Err(ServiceError::Inference(format!(
                "model returned {} scores, expected {}",
                scores.len(),
                expected
            )));
        }

        let probs = as_probabilities(scores);
        let (class_id, confidence) = arg_max(&probs)
            .ok_or_else(|| ServiceError::Inference("model returned no usable scores".to_string()))?;

        let class_id = class_id as u32;
        let label = self.labels.label(class_id).to_string();
        let action = SignAction::for_label(&label);

        tracing::debug!(
            "Predicted class {} '{}' at {:.4} ({})",
            class_id,
            label,
            confidence,
            action
        );

        Ok(PredictionResult {
            label,
            class_id,
            confidence: confidence.clamp(0.0, 1.0),
            critical: is_critical(class_id),
            action,
        })
    }
}

/// Index and value of the largest finite score.
fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Pass a probability vector through; softmax anything else.
fn as_probabilities(scores: Vec<f32>) -> Vec<f32> {
    let in_range = scores.iter().all(|v| (0.0..=1.0).contains(v));
    let total: f32 = scores.iter().sum();
    if in_range && (total - 1.0).abs() < 1e-3 {
        return scores;
    }

    let max = scores
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|v| v.is_finite()).sum();
    exps.into_iter().map(|v| v / sum).collect()
}
