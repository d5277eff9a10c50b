//! Class id → human-readable sign description
//!
//! The table ships as a JSON asset and is validated against the width of the
//! classifier output before the service starts answering requests.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

const GTSRB_LABELS: &str = include_str!("../../../assets/labels/gtsrb.json");

pub const DEFAULT_FALLBACK_LABEL: &str = "Unknown Sign";

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read label table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed label table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("label for class {0} is empty")]
    EmptyLabel(u32),
    #[error("fallback label is empty")]
    EmptyFallback,
}

#[derive(Debug, Deserialize)]
struct LabelFile {
    #[serde(default = "default_fallback")]
    fallback: String,
    labels: BTreeMap<u32, String>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_LABEL.to_string()
}

/// Immutable label table with a fallback for ids it does not cover.
#[derive(Debug, Clone)]
pub struct ClassLabelTable {
    labels: BTreeMap<u32, String>,
    fallback: String,
}

/// Outcome of checking a table against a model's output width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Ids the model can emit that have no label.
    pub missing: Vec<u32>,
    /// Labelled ids the model can never emit.
    pub unreachable: Vec<u32>,
}

impl Coverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl ClassLabelTable {
    /// The 43-class GTSRB table bundled with the service.
    pub fn gtsrb() -> Result<Self, LabelError> {
        Self::from_json(GTSRB_LABELS)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LabelError> {
        let file: LabelFile = serde_json::from_str(raw)?;

        if file.fallback.trim().is_empty() {
            return Err(LabelError::EmptyFallback);
        }
        if let Some((&id, _)) = file.labels.iter().find(|(_, l)| l.trim().is_empty()) {
            return Err(LabelError::EmptyLabel(id));
        }

        Ok(Self {
            labels: file.labels,
            fallback: file.fallback,
        })
    }

    /// Label for `class_id`, or the fallback when the table has no entry.
    pub fn label(&self, class_id: u32) -> &str {
        self.labels
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.labels.contains_key(&class_id)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Compare the table with the ids `0..num_classes` a model can produce.
    pub fn coverage(&self, num_classes: usize) -> Coverage {
        let num_classes = num_classes as u32;
        Coverage {
            missing: (0..num_classes).filter(|id| !self.contains(*id)).collect(),
            unreachable: self
                .labels
                .keys()
                .copied()
                .filter(|id| *id >= num_classes)
                .collect(),
        }
    }
}
