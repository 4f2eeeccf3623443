//! Jangle Classifier
//!
//! Decides whether Jangle will eat whatever is in a picture.
//!
//! - [`model_loader`] reads a model directory (manifest plus safetensors
//!   weights) once at startup and builds an [`ImagePredictor`].
//! - [`handler`] turns an optional upload into a tagged [`Outcome`]: an
//!   empty-input message, a verdict with per-class confidence scores, or an
//!   error payload.
//!
//! The predictor is injected into the handler as `Arc<dyn Predictor>`, so
//! tests and embedders can swap in their own implementation.

pub mod handler;
pub mod image_predictor;
pub mod model_config;
pub mod model_loader;
pub mod predictor;
pub mod preprocess;
pub mod verdict;

pub use handler::{
    ConfidenceScores, Outcome, PredictionError, PredictionHandler, PredictionResult,
    EMPTY_INPUT_MESSAGE, ERROR_PREFIX,
};
pub use image_predictor::ImagePredictor;
pub use model_config::{
    Architecture, DeviceType, InferenceConfig, ModelManifest, ModelSource, PreprocessConfig,
};
pub use model_loader::{ModelLoader, DEFAULT_MODEL_DIR, MANIFEST_FILE};
pub use predictor::{Prediction, Predictor};
pub use preprocess::{decode_image, ImagePreprocessor};
pub use verdict::Verdict;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::handler::{Outcome, PredictionHandler, PredictionResult};
    pub use crate::model_loader::ModelLoader;
    pub use crate::predictor::{Prediction, Predictor};
    pub use crate::verdict::Verdict;
    pub use jangle_core::{Error, Result, Vocabulary};
}
