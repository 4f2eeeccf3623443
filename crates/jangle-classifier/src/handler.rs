//! Prediction handler: image in, verdict out
//!
//! The handler is the boundary the web layer talks to. It never fails:
//! every call produces an [`Outcome`], which serializes to the same JSON
//! shapes the demo UI has always consumed.

use crate::predictor::{Prediction, Predictor};
use crate::preprocess::decode_image;
use crate::verdict::Verdict;
use jangle_core::{Error, Result, Vocabulary};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Message returned when no image was supplied
pub const EMPTY_INPUT_MESSAGE: &str = "Please upload an image";

/// Prefix of every per-request error payload
pub const ERROR_PREFIX: &str = "Error processing image: ";

/// Result of handling one request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No image was supplied
    EmptyInput,
    /// The image was classified
    Prediction(PredictionResult),
    /// Decoding or inference failed
    Error(PredictionError),
}

impl Outcome {
    pub fn is_prediction(&self) -> bool {
        matches!(self, Self::Prediction(_))
    }

    pub fn as_prediction(&self) -> Option<&PredictionResult> {
        match self {
            Self::Prediction(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&PredictionError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl From<Result<PredictionResult>> for Outcome {
    fn from(result: Result<PredictionResult>) -> Self {
        match result {
            Ok(prediction) => Self::Prediction(prediction),
            Err(e) => Self::Error(PredictionError::from_error(&e)),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::EmptyInput => serializer.serialize_str(EMPTY_INPUT_MESSAGE),
            Self::Prediction(result) => result.serialize(serializer),
            Self::Error(error) => error.serialize(serializer),
        }
    }
}

/// Successful classification, ready for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Human-readable verdict
    #[serde(rename = "prediction")]
    pub verdict: String,

    /// Probability for every vocabulary label
    pub confidence_scores: ConfidenceScores,

    /// Winning label
    pub predicted_class: String,

    /// Machine-readable verdict
    pub will_eat: bool,

    /// Inference latency in microseconds
    #[serde(skip)]
    pub latency_us: u64,
}

impl PredictionResult {
    /// Attach the verdict and per-label scores to a raw prediction
    pub fn from_prediction(vocabulary: &Vocabulary, prediction: Prediction) -> Result<Self> {
        let confidence_scores = ConfidenceScores::zip(vocabulary, &prediction.probabilities)?;
        if !vocabulary.contains(&prediction.label) {
            return Err(Error::vocabulary(format!(
                "predicted label '{}' is not in the vocabulary",
                prediction.label
            )));
        }

        let verdict = Verdict::for_label(&prediction.label);
        Ok(Self {
            verdict: verdict.message().to_string(),
            confidence_scores,
            predicted_class: prediction.label,
            will_eat: verdict.will_eat(),
            latency_us: prediction.latency_us,
        })
    }

    pub fn verdict_kind(&self) -> Verdict {
        Verdict::for_label(&self.predicted_class)
    }
}

/// Per-request failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionError {
    pub error: String,
}

impl PredictionError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            error: format!("{}{}", ERROR_PREFIX, message),
        }
    }

    pub fn from_error(error: &Error) -> Self {
        Self::new(error)
    }

    /// Failure to obtain the image at all; carries its message unprefixed
    pub fn fetch(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Label → probability pairs, in vocabulary order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfidenceScores(Vec<(String, f32)>);

impl ConfidenceScores {
    /// Pair labels with probabilities by position
    pub fn zip(vocabulary: &Vocabulary, probabilities: &[f32]) -> Result<Self> {
        if vocabulary.len() != probabilities.len() {
            return Err(Error::inference(format!(
                "{} probabilities for {} labels",
                probabilities.len(),
                vocabulary.len()
            )));
        }

        Ok(Self(
            vocabulary
                .iter()
                .zip(probabilities)
                .map(|(label, p)| (label.to_string(), *p))
                .collect(),
        ))
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn total(&self) -> f32 {
        self.0.iter().map(|(_, p)| p).sum()
    }

    /// Label with the highest score
    pub fn top_label(&self) -> Option<&str> {
        let scores: Vec<f32> = self.0.iter().map(|(_, p)| *p).collect();
        crate::predictor::argmax(&scores).map(|(i, _)| self.0[i].0.as_str())
    }
}

impl Serialize for ConfidenceScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

/// Classifies uploaded images with a shared predictor
#[derive(Clone)]
pub struct PredictionHandler {
    predictor: Arc<dyn Predictor>,
}

impl std::fmt::Debug for PredictionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionHandler")
            .field("predictor", &self.predictor.name())
            .finish()
    }
}

impl PredictionHandler {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.predictor.vocabulary()
    }

    /// Handle an optional uploaded image; never fails
    pub async fn handle(&self, image: Option<&[u8]>) -> Outcome {
        let bytes = match image {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                metrics::counter!("jangle_empty_requests_total").increment(1);
                tracing::debug!("No image supplied");
                return Outcome::EmptyInput;
            }
        };

        let start = Instant::now();
        let outcome = Outcome::from(self.try_handle(bytes).await);

        match &outcome {
            Outcome::Prediction(result) => {
                metrics::counter!(
                    "jangle_predictions_total",
                    "class" => result.predicted_class.clone()
                )
                .increment(1);
                metrics::histogram!("jangle_prediction_latency_us")
                    .record(start.elapsed().as_micros() as f64);
                tracing::debug!(
                    class = %result.predicted_class,
                    will_eat = result.will_eat,
                    "Prediction complete"
                );
            }
            Outcome::Error(error) => {
                metrics::counter!("jangle_prediction_errors_total").increment(1);
                tracing::warn!("{}", error.error);
            }
            Outcome::EmptyInput => {}
        }

        outcome
    }

    /// Decode and classify, returning failures as errors
    pub async fn try_handle(&self, bytes: &[u8]) -> Result<PredictionResult> {
        // Decoding large uploads is CPU-bound, keep it off the async workers
        let owned = bytes.to_vec();
        let image = tokio::task::spawn_blocking(move || decode_image(&owned))
            .await
            .map_err(|e| Error::internal(format!("Decode task failed: {}", e)))??;
        let prediction = self.predictor.predict(image).await?;
        PredictionResult::from_prediction(self.predictor.vocabulary(), prediction)
    }
}
