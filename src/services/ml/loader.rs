//! Locating and loading model artifacts
//!
//! Each slot has an ordered list of candidate weight paths. The first one
//! that exists wins; its manifest sits next to it with a `.json` extension.

use super::manifest::{CnnManifest, LstmManifest, ModelManifest};
use super::price_lstm::PriceLstm;
use super::traffic_net::TrafficSignNet;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no model artifact found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("manifest {path} could not be read: {source}")]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest {path} is malformed: {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("manifest {path} describes a {found} model, expected {expected}")]
    WrongKind {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build model: {0}")]
    Candle(#[from] candle_core::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct ModelLoader;

impl ModelLoader {
    /// First candidate that exists on disk.
    pub fn locate(candidates: &[PathBuf]) -> Result<PathBuf, LoadError> {
        for path in candidates {
            if path.is_file() {
                tracing::info!("📦 Found model artifact at {}", path.display());
                return Ok(path.clone());
            }
            tracing::debug!("No artifact at {}", path.display());
        }
        Err(LoadError::NotFound {
            searched: candidates.to_vec(),
        })
    }

    pub fn manifest_path(weights: &Path) -> PathBuf {
        weights.with_extension("json")
    }

    pub fn read_manifest(weights: &Path) -> Result<ModelManifest, LoadError> {
        let path = Self::manifest_path(weights);
        let raw = std::fs::read_to_string(&path).map_err(|source| LoadError::ManifestIo {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| LoadError::ManifestParse { path, source })
    }

    /// Check the safetensors header before reading the tensors.
    ///
    /// Layout: little-endian u64 header length, then that many bytes of JSON.
    pub fn validate_safetensors<P: AsRef<Path>>(path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let invalid = |reason: String| LoadError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let size = std::fs::metadata(path)?.len();
        if size < 10 {
            return Err(invalid(format!("file too small ({size} bytes)")));
        }

        let mut file = std::fs::File::open(path)?;
        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let header_len = u64::from_le_bytes(len_bytes);
        if header_len == 0 || header_len > size - 8 {
            return Err(invalid(format!(
                "header length {header_len} does not fit in {size} bytes"
            )));
        }

        let mut first = [0u8; 1];
        file.read_exact(&mut first)?;
        if first[0] != b'{' {
            return Err(invalid("header is not a JSON object".to_string()));
        }

        tracing::debug!(
            "✅ safetensors validation passed: {} ({:.2} MB)",
            path.display(),
            size as f64 / (1024.0 * 1024.0)
        );
        Ok(())
    }

    fn var_builder(weights: &Path, device: &Device) -> Result<VarBuilder<'static>, LoadError> {
        Self::validate_safetensors(weights)?;
        let tensors = candle_core::safetensors::load(weights, device)?;
        tracing::debug!("Read {} tensors from {}", tensors.len(), weights.display());
        Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
    }

    pub fn load_classifier(
        candidates: &[PathBuf],
        device: &Device,
    ) -> Result<TrafficSignNet, LoadError> {
        let weights = Self::locate(candidates)?;
        let manifest = Self::read_cnn_manifest(&weights)?;
        tracing::info!(
            "🔧 Loading classifier {} with preprocessing {}",
            weights.display(),
            manifest.preprocess.version
        );
        let vb = Self::var_builder(&weights, device)?;
        Ok(TrafficSignNet::new(manifest, vb)?)
    }

    pub fn load_forecaster(candidates: &[PathBuf], device: &Device) -> Result<PriceLstm, LoadError> {
        let weights = Self::locate(candidates)?;
        let manifest = Self::read_lstm_manifest(&weights)?;
        tracing::info!(
            "🔧 Loading forecaster {} (window {})",
            weights.display(),
            manifest.window
        );
        let vb = Self::var_builder(&weights, device)?;
        Ok(PriceLstm::new(&manifest, vb)?)
    }

    fn read_cnn_manifest(weights: &Path) -> Result<CnnManifest, LoadError> {
        match Self::read_manifest(weights)? {
            ModelManifest::TrafficSignCnn(m) => Ok(m),
            other => Err(LoadError::WrongKind {
                path: Self::manifest_path(weights),
                expected: "traffic_sign_cnn",
                found: other.kind(),
            }),
        }
    }

    fn read_lstm_manifest(weights: &Path) -> Result<LstmManifest, LoadError> {
        match Self::read_manifest(weights)? {
            ModelManifest::PriceLstm(m) => Ok(m),
            other => Err(LoadError::WrongKind {
                path: Self::manifest_path(weights),
                expected: "price_lstm",
                found: other.kind(),
            }),
        }
    }
}
