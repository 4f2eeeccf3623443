//! Image decoding and tensor preparation

use crate::model_config::PreprocessConfig;
use candle_core::{DType, Device, Tensor};
use image::imageops::FilterType;
use image::DynamicImage;
use jangle_core::{Error, Result};

/// Decode an uploaded payload into a bitmap
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::image("empty image payload"));
    }
    image::load_from_memory(bytes).map_err(|e| Error::image(format!("Invalid image: {}", e)))
}

/// Turns bitmaps into normalized `(1, 3, H, W)` input tensors
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Resize to the model input size and apply mean/std normalization
    pub fn preprocess(&self, image: &DynamicImage, device: &Device) -> Result<Tensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::image(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let size = self.config.input_size;
        let resized = image
            .resize_exact(size as u32, size as u32, FilterType::Triangle)
            .to_rgb8();

        let tensor_err = |e: candle_core::Error| Error::image(format!("Failed to build input tensor: {}", e));

        let pixels = Tensor::from_vec(resized.into_raw(), (size, size, 3), device)
            .map_err(tensor_err)?
            .permute((2, 0, 1))
            .map_err(tensor_err)?;
        let mean = Tensor::new(&self.config.mean, device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(tensor_err)?;
        let std = Tensor::new(&self.config.std, device)
            .and_then(|t| t.reshape((3, 1, 1)))
            .map_err(tensor_err)?;

        let scaled = (pixels.to_dtype(DType::F32).map_err(tensor_err)? / 255.0).map_err(tensor_err)?;
        scaled
            .broadcast_sub(&mean)
            .and_then(|t| t.broadcast_div(&std))
            .and_then(|t| t.unsqueeze(0))
            .map_err(tensor_err)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}
