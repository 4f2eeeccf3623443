//! Shared classification types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label for the class Jangle refuses because it is durian
pub const DURIAN: &str = "durian";

/// Label for the class Jangle refuses because it is not food
pub const INEDIBLE: &str = "inedible";

/// Label the model is trained with for everything Jangle will eat
pub const NON_DURIAN_EDIBLE: &str = "non_durian_edible";

/// Number of classes the verdict table understands
pub const EXPECTED_CLASSES: usize = 3;

/// Ordered list of class labels, in the same order as the model's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    /// Create a vocabulary from labels in model output order
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// The vocabulary every shipped Jangle model is trained with
    pub fn jangle() -> Self {
        Self::new([DURIAN, INEDIBLE, NON_DURIAN_EDIBLE])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label at the given output index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Output index of the given label
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|l| l == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Check that the vocabulary can drive the verdict table.
    ///
    /// Requires exactly three distinct labels including `durian` and
    /// `inedible`. The remaining label is treated as the edible class,
    /// whatever the artifact calls it.
    pub fn validate(&self) -> Result<()> {
        if self.len() != EXPECTED_CLASSES {
            return Err(Error::vocabulary(format!(
                "expected {} labels, model declares {}: {:?}",
                EXPECTED_CLASSES,
                self.len(),
                self.0
            )));
        }

        for (i, label) in self.0.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(Error::vocabulary(format!("label {} is empty", i)));
            }
            if self.0[..i].contains(label) {
                return Err(Error::vocabulary(format!("duplicate label '{}'", label)));
            }
        }

        for required in [DURIAN, INEDIBLE] {
            if !self.contains(required) {
                return Err(Error::vocabulary(format!(
                    "missing required label '{}' in {:?}",
                    required, self.0
                )));
            }
        }

        Ok(())
    }

    /// The label that is neither durian nor inedible
    pub fn edible_label(&self) -> Option<&str> {
        self.iter().find(|l| *l != DURIAN && *l != INEDIBLE)
    }
}
