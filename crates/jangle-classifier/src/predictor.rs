//! Predictor trait and raw prediction output

use async_trait::async_trait;
use image::DynamicImage;
use jangle_core::{Error, Result, Vocabulary};

/// Trait for anything that can classify a decoded image
///
/// Implementations are immutable after construction and shared across
/// requests behind an `Arc`.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Classify the given image
    async fn predict(&self, image: DynamicImage) -> Result<Prediction>;

    /// Labels in the order the probability vector is reported
    fn vocabulary(&self) -> &Vocabulary;

    /// Get the predictor name
    fn name(&self) -> &str;
}

/// Raw output of a predictor
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Winning label
    pub label: String,

    /// Index of the winning label in the vocabulary
    pub index: usize,

    /// Per-class probabilities, vocabulary order
    pub probabilities: Vec<f32>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl Prediction {
    /// Build a prediction from a probability vector, picking the argmax label
    pub fn from_probabilities(vocabulary: &Vocabulary, probabilities: Vec<f32>) -> Result<Self> {
        if probabilities.len() != vocabulary.len() {
            return Err(Error::inference(format!(
                "model returned {} probabilities for {} labels",
                probabilities.len(),
                vocabulary.len()
            )));
        }

        let (index, _) = argmax(&probabilities)
            .ok_or_else(|| Error::inference("model returned no finite probabilities"))?;
        let label = vocabulary
            .get(index)
            .ok_or_else(|| Error::inference(format!("no label at index {}", index)))?
            .to_string();

        Ok(Self {
            label,
            index,
            probabilities,
            latency_us: 0,
        })
    }

    /// Probability of the winning label, if `index` points into `probabilities`
    pub fn confidence(&self) -> Option<f32> {
        self.probabilities.get(self.index).copied()
    }
}

/// Index and value of the largest finite entry; the first one wins ties
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best, (i, v)| match best {
            Some((_, best_v)) if best_v >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_max_wins() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some((1, 0.4)));
        assert_eq!(argmax(&[0.9, 0.05, 0.05]), Some((0, 0.9)));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.1]), Some((1, 0.1)));
    }

    #[test]
    fn test_from_probabilities_picks_label() {
        let vocab = Vocabulary::jangle();
        let prediction = Prediction::from_probabilities(&vocab, vec![0.1, 0.2, 0.7]).unwrap();
        assert_eq!(prediction.label, "non_durian_edible");
        assert_eq!(prediction.index, 2);
        assert!((prediction.confidence().unwrap() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_confidence_with_out_of_range_index() {
        let prediction = Prediction {
            label: "durian".to_string(),
            index: 7,
            probabilities: vec![0.5, 0.25, 0.25],
            latency_us: 0,
        };
        assert_eq!(prediction.confidence(), None);
    }

    #[test]
    fn test_from_probabilities_length_mismatch() {
        let vocab = Vocabulary::jangle();
        let err = Prediction::from_probabilities(&vocab, vec![0.5, 0.5]).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_from_probabilities_all_nan() {
        let vocab = Vocabulary::jangle();
        let result = Prediction::from_probabilities(&vocab, vec![f32::NAN; 3]);
        assert!(result.is_err());
    }
}
