//! Candle-backed image predictor

use crate::model_config::{Architecture, PreprocessConfig};
use crate::predictor::{Prediction, Predictor};
use crate::preprocess::ImagePreprocessor;
use async_trait::async_trait;
use candle_core::{DType, Device, Module, D};
use candle_nn::{Func, VarBuilder};
use image::DynamicImage;
use jangle_core::{Error, Result, Vocabulary};
use std::time::Instant;

/// ResNet classifier with its vocabulary and input normalization
#[derive(Clone)]
pub struct ImagePredictor {
    name: String,
    architecture: Architecture,
    model: Func<'static>,
    device: Device,
    vocabulary: Vocabulary,
    preprocessor: ImagePreprocessor,
}

impl std::fmt::Debug for ImagePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePredictor")
            .field("name", &self.name)
            .field("architecture", &self.architecture)
            .field("device", &self.device)
            .field("vocabulary", &self.vocabulary)
            .finish()
    }
}

impl ImagePredictor {
    /// Build the network from weights exposed by a `VarBuilder`.
    ///
    /// The classification head is sized from the vocabulary, so weights with
    /// a different number of outputs fail here rather than at request time.
    pub fn from_var_builder(
        name: impl Into<String>,
        architecture: Architecture,
        vocabulary: Vocabulary,
        preprocessing: PreprocessConfig,
        vb: VarBuilder<'static>,
        device: Device,
    ) -> Result<Self> {
        use candle_transformers::models::resnet;

        let num_classes = vocabulary.len();
        let model = match architecture {
            Architecture::Resnet18 => resnet::resnet18(num_classes, vb),
            Architecture::Resnet34 => resnet::resnet34(num_classes, vb),
            Architecture::Resnet50 => resnet::resnet50(num_classes, vb),
            Architecture::Resnet101 => resnet::resnet101(num_classes, vb),
            Architecture::Resnet152 => resnet::resnet152(num_classes, vb),
        }
        .map_err(|e| Error::model(format!("Failed to build {} weights: {}", architecture, e)))?;

        Ok(Self {
            name: name.into(),
            architecture,
            model,
            device,
            vocabulary,
            preprocessor: ImagePreprocessor::new(preprocessing),
        })
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn preprocessor(&self) -> &ImagePreprocessor {
        &self.preprocessor
    }

    /// Run preprocessing, the forward pass and softmax on the calling thread
    pub fn probabilities(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let input = self.preprocessor.preprocess(image, &self.device)?;

        let logits = self
            .model
            .forward(&input)
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        let (batch, classes) = logits
            .dims2()
            .map_err(|e| Error::inference(format!("Unexpected output rank: {}", e)))?;
        if batch != 1 || classes != self.vocabulary.len() {
            return Err(Error::inference(format!(
                "model produced shape [{}, {}], expected [1, {}]",
                batch,
                classes,
                self.vocabulary.len()
            )));
        }

        candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Failed to read probabilities: {}", e)))
    }
}

#[async_trait]
impl Predictor for ImagePredictor {
    async fn predict(&self, image: DynamicImage) -> Result<Prediction> {
        let start = Instant::now();

        let this = self.clone();
        let probabilities = tokio::task::spawn_blocking(move || this.probabilities(&image))
            .await
            .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))??;

        let mut prediction = Prediction::from_probabilities(&self.vocabulary, probabilities)?;
        prediction.latency_us = start.elapsed().as_micros() as u64;

        tracing::debug!(
            model = %self.name,
            label = %prediction.label,
            confidence = prediction.confidence(),
            latency_us = prediction.latency_us,
            "Image classified"
        );

        Ok(prediction)
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn name(&self) -> &str {
        &self.name
    }
}
