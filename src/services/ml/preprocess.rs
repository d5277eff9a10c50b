//! Image → model input tensor
//!
//! Every step must match the preprocessing the weights were trained with:
//! RGB conversion, exact resize, optional [0,1] scaling, leading batch axis.
//! The output layout is NHWC `(1, height, width, 3)`.

use super::manifest::PreprocessContract;
use crate::error::ServiceError;
use candle_core::{Device, Tensor};
use image::{imageops::FilterType, DynamicImage, RgbImage};

pub const CHANNELS: usize = 3;

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::Decode("empty upload".to_string()));
    }
    let image = image::load_from_memory(bytes).map_err(|e| ServiceError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ServiceError::Decode("image has no pixels".to_string()));
    }
    Ok(image)
}

/// Drop alpha / expand grayscale, then resize to the contract's resolution.
pub fn conform(image: &DynamicImage, contract: &PreprocessContract) -> RgbImage {
    let rgb = image.to_rgb8();
    if rgb.dimensions() == (contract.width, contract.height) {
        return rgb;
    }
    image::imageops::resize(&rgb, contract.width, contract.height, FilterType::CatmullRom)
}

pub fn to_tensor(
    rgb: &RgbImage,
    contract: &PreprocessContract,
    device: &Device,
) -> candle_core::Result<Tensor> {
    let scale = if contract.normalize { 255.0 } else { 1.0 };
    let data: Vec<f32> = rgb.as_raw().iter().map(|&p| p as f32 / scale).collect();
    Tensor::from_vec(
        data,
        (1, rgb.height() as usize, rgb.width() as usize, CHANNELS),
        device,
    )
}

/// Full pipeline from uploaded bytes to a batch of one.
pub fn preprocess(
    bytes: &[u8],
    contract: &PreprocessContract,
    device: &Device,
) -> Result<Tensor, ServiceError> {
    let image = decode(bytes)?;
    tracing::debug!(
        "Decoded {}x{} {:?} image, resizing to {}x{} ({})",
        image.width(),
        image.height(),
        image.color(),
        contract.width,
        contract.height,
        contract.version
    );
    let rgb = conform(&image, contract);
    Ok(to_tensor(&rgb, contract, device)?)
}
