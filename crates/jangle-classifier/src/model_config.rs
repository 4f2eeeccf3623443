//! Model manifest structures
//!
//! Every model directory carries a `model.yaml` beside its weights. The
//! manifest names the architecture, the output vocabulary and the input
//! normalization the weights were trained with.

use jangle_core::{Error, Result, Vocabulary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Manifest describing a serialized classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name
    #[serde(default = "default_name")]
    pub name: String,

    /// Model version
    #[serde(default)]
    pub version: String,

    /// Model description
    #[serde(default)]
    pub description: String,

    /// Where the weights come from
    #[serde(default)]
    pub source: ModelSource,

    /// Network architecture the weights belong to
    pub architecture: Architecture,

    /// Class labels in model output order
    pub labels: Vocabulary,

    /// Input normalization
    #[serde(default)]
    pub preprocessing: PreprocessConfig,

    /// Inference settings
    #[serde(default)]
    pub inference: InferenceConfig,
}

fn default_name() -> String {
    "jangle".to_string()
}

/// Weights source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSource {
    /// Load from the model directory (relative paths are resolved against it)
    Local {
        #[serde(default = "default_weights_file")]
        path: PathBuf,
    },

    /// Download from HuggingFace Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
        #[serde(default = "default_weights_name")]
        filename: String,
    },
}

impl Default for ModelSource {
    fn default() -> Self {
        Self::Local {
            path: default_weights_file(),
        }
    }
}

fn default_weights_file() -> PathBuf {
    PathBuf::from(default_weights_name())
}

fn default_weights_name() -> String {
    "model.safetensors".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

/// Supported backbones, weights in torchvision naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Resnet18,
    Resnet34,
    Resnet50,
    Resnet101,
    Resnet152,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resnet18 => "resnet18",
            Self::Resnet34 => "resnet34",
            Self::Resnet50 => "resnet50",
            Self::Resnet101 => "resnet101",
            Self::Resnet152 => "resnet152",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image preprocessing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Square side the image is resized to
    #[serde(default = "default_input_size")]
    pub input_size: usize,

    /// Per-channel mean (RGB, on the 0..1 scale)
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],

    /// Per-channel standard deviation (RGB, on the 0..1 scale)
    #[serde(default = "default_std")]
    pub std: [f32; 3],
}

fn default_input_size() -> usize {
    224
}

fn default_mean() -> [f32; 3] {
    [0.485, 0.456, 0.406]
}

fn default_std() -> [f32; 3] {
    [0.229, 0.224, 0.225]
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_size: default_input_size(),
            mean: default_mean(),
            std: default_std(),
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_size < 32 {
            return Err(Error::config(format!(
                "input_size must be at least 32, got {}",
                self.input_size
            )));
        }
        if self.std.iter().any(|s| *s <= 0.0) {
            return Err(Error::config("std values must be positive"));
        }
        Ok(())
    }
}

/// Inference configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Device to run on (cpu, cuda[:N], metal[:N])
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_device() -> String {
    "cpu".to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize),
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (kind, ordinal) = match s.split_once(':') {
            Some((kind, idx)) => {
                let idx = idx
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid device ordinal in '{}'", s)))?;
                (kind.to_string(), idx)
            }
            None => (s.clone(), 0),
        };

        match kind.as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda(ordinal)),
            "metal" | "mps" => Ok(Self::Metal(ordinal)),
            other => Err(Error::config(format!("unknown device '{}'", other))),
        }
    }
}

impl ModelManifest {
    /// Load a manifest from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::model(format!("Failed to read manifest {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a manifest from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let manifest: ModelManifest = serde_yaml::from_str(contents)?;
        Ok(manifest)
    }

    /// Check everything that can be checked without touching the weights
    pub fn validate(&self) -> Result<()> {
        self.labels.validate()?;
        self.preprocessing.validate()?;
        self.device_type()?;
        Ok(())
    }

    pub fn device_type(&self) -> Result<DeviceType> {
        self.inference.device.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
name: "jangle-resnet34"
version: "1.0"
description: "Will Jangle eat this?"
source:
  type: local
  path: "weights/model.safetensors"
architecture: resnet34
labels:
  - durian
  - inedible
  - non_durian_edible
preprocessing:
  input_size: 192
inference:
  device: "cpu"
"#;

        let manifest = ModelManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.name, "jangle-resnet34");
        assert_eq!(manifest.architecture, Architecture::Resnet34);
        assert_eq!(manifest.labels, Vocabulary::jangle());
        assert_eq!(manifest.preprocessing.input_size, 192);
        assert_eq!(manifest.preprocessing.mean, default_mean());
        assert!(manifest.validate().is_ok());

        match &manifest.source {
            ModelSource::Local { path } => {
                assert_eq!(path.to_str().unwrap(), "weights/model.safetensors");
            }
            _ => panic!("Expected local source"),
        }
    }

    #[test]
    fn test_minimal_manifest_defaults() {
        let yaml = r#"
architecture: resnet18
labels: [durian, inedible, non_durian_edible]
"#;

        let manifest = ModelManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.name, "jangle");
        assert_eq!(manifest.source, ModelSource::default());
        assert_eq!(manifest.preprocessing, PreprocessConfig::default());
        assert_eq!(manifest.device_type().unwrap(), DeviceType::Cpu);
    }

    #[test]
    fn test_huggingface_source() {
        let yaml = r#"
source:
  type: huggingface
  repo: "defijangle/will-jangle-eat"
architecture: resnet50
labels: [durian, inedible, non_durian_edible]
"#;

        let manifest = ModelManifest::from_yaml(yaml).unwrap();
        if let ModelSource::HuggingFace { repo, revision, filename } = &manifest.source {
            assert_eq!(repo, "defijangle/will-jangle-eat");
            assert_eq!(revision, "main");
            assert_eq!(filename, "model.safetensors");
        } else {
            panic!("Expected HuggingFace source");
        }
    }

    #[test]
    fn test_unknown_architecture_rejected() {
        let yaml = r#"
architecture: vit-huge
labels: [durian, inedible, non_durian_edible]
"#;
        assert!(ModelManifest::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_invalid_vocabulary_fails_validation() {
        let yaml = r#"
architecture: resnet18
labels: [cat, dog]
"#;
        let manifest = ModelManifest::from_yaml(yaml).unwrap();
        assert!(matches!(manifest.validate(), Err(Error::Vocabulary(_))));
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<DeviceType>().unwrap(), DeviceType::Cpu);
        assert_eq!("CUDA".parse::<DeviceType>().unwrap(), DeviceType::Cuda(0));
        assert_eq!("cuda:2".parse::<DeviceType>().unwrap(), DeviceType::Cuda(2));
        assert_eq!("mps".parse::<DeviceType>().unwrap(), DeviceType::Metal(0));
        assert!("tpu".parse::<DeviceType>().is_err());
        assert!("cuda:x".parse::<DeviceType>().is_err());
    }

    #[test]
    fn test_preprocess_validation() {
        let mut config = PreprocessConfig::default();
        assert!(config.validate().is_ok());

        config.input_size = 8;
        assert!(config.validate().is_err());

        config.input_size = 224;
        config.std = [0.2, 0.0, 0.2];
        assert!(config.validate().is_err());
    }
}
