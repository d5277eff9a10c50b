//! Convolutional traffic-sign classifier
//!
//! Layout per block: `conv3x3 → relu → batch-norm → maxpool2`, followed by
//! flatten, one hidden dense layer with relu and a softmax output layer.
//!
//! Expected tensor names in the safetensors file:
//! - `blocks.{i}.conv.{weight,bias}` with weight `(out, in, 3, 3)`
//! - `blocks.{i}.norm.{weight,bias,running_mean,running_var}`
//! - `hidden.{weight,bias}` and `output.{weight,bias}` with weight `(out, in)`
//!
//! The flatten step runs in NHWC order so that weights exported from a
//! channels-last framework line up without re-ordering the dense layer.

use super::classifier::ImageClassifier;
use super::manifest::{CnnManifest, PreprocessContract};
use candle_core::{Device, Module, ModuleT, Result, Tensor, D};
use candle_nn::{
    batch_norm, conv2d, linear, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, Linear,
    VarBuilder,
};

const KERNEL: usize = 3;
const POOL: usize = 2;
const INPUT_CHANNELS: usize = 3;

struct ConvBlock {
    conv: Conv2d,
    norm: BatchNorm,
}

impl ConvBlock {
    fn new(in_channels: usize, out_channels: usize, eps: f64, vb: VarBuilder) -> Result<Self> {
        let conv = conv2d(
            in_channels,
            out_channels,
            KERNEL,
            Conv2dConfig::default(),
            vb.pp("conv"),
        )?;
        let config = BatchNormConfig {
            eps,
            ..Default::default()
        };
        let norm = batch_norm(out_channels, config, vb.pp("norm"))?;
        Ok(Self { conv, norm })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.conv.forward(x)?.relu()?;
        let x = self.norm.forward_t(&x, false)?;
        x.max_pool2d(POOL)
    }
}

pub struct TrafficSignNet {
    blocks: Vec<ConvBlock>,
    hidden: Linear,
    output: Linear,
    manifest: CnnManifest,
    device: Device,
}

impl TrafficSignNet {
    pub fn new(manifest: CnnManifest, vb: VarBuilder) -> Result<Self> {
        let flat = Self::flatten_size(&manifest)?;
        let device = vb.device().clone();

        let mut blocks = Vec::with_capacity(manifest.conv_filters.len());
        let mut in_channels = INPUT_CHANNELS;
        for (i, &filters) in manifest.conv_filters.iter().enumerate() {
            blocks.push(ConvBlock::new(
                in_channels,
                filters,
                manifest.batch_norm_eps,
                vb.pp(format!("blocks.{i}")),
            )?);
            in_channels = filters;
        }

        let hidden = linear(flat, manifest.dense_units, vb.pp("hidden"))?;
        let output = linear(manifest.dense_units, manifest.num_classes, vb.pp("output"))?;

        tracing::info!(
            "🧠 Built traffic-sign CNN: {} blocks, flatten {}, {} classes, input {}",
            blocks.len(),
            flat,
            manifest.num_classes,
            manifest.preprocess.version
        );

        Ok(Self {
            blocks,
            hidden,
            output,
            manifest,
            device,
        })
    }

    /// Width of the flattened feature vector after the last block.
    pub fn flatten_size(manifest: &CnnManifest) -> Result<usize> {
        if manifest.conv_filters.is_empty() {
            candle_core::bail!("manifest declares no conv blocks");
        }
        let mut h = manifest.preprocess.height as usize;
        let mut w = manifest.preprocess.width as usize;
        for _ in &manifest.conv_filters {
            if h < KERNEL + 1 || w < KERNEL + 1 {
                candle_core::bail!(
                    "input {}x{} too small for {} conv blocks",
                    manifest.preprocess.width,
                    manifest.preprocess.height,
                    manifest.conv_filters.len()
                );
            }
            h = (h - KERNEL + 1) / POOL;
            w = (w - KERNEL + 1) / POOL;
        }
        let channels = manifest.conv_filters[manifest.conv_filters.len() - 1];
        Ok(h * w * channels)
    }
}

impl ImageClassifier for TrafficSignNet {
    fn contract(&self) -> &PreprocessContract {
        &self.manifest.preprocess
    }

    fn num_classes(&self) -> usize {
        self.manifest.num_classes
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, input: &Tensor) -> Result<Tensor> {
        // NHWC → NCHW for the conv stack.
        let mut x = input.permute((0, 3, 1, 2))?.contiguous()?;
        for block in &self.blocks {
            x = block.forward(&x)?;
        }
        let x = x.permute((0, 2, 3, 1))?.contiguous()?.flatten_from(1)?;
        let x = self.hidden.forward(&x)?.relu()?;
        let logits = self.output.forward(&x)?;
        candle_nn::ops::softmax(&logits, D::Minus1)
    }
}
