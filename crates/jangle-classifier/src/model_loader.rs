//! Loading the serialized classifier artifact at startup
//!
//! A model directory holds a `model.yaml` manifest and, for local sources,
//! the safetensors weights it points to. Loading is all-or-nothing: any
//! missing file, unknown architecture, wrong vocabulary or weight mismatch
//! is an error and the caller is expected to abort startup.

use crate::image_predictor::ImagePredictor;
use crate::model_config::{DeviceType, ModelManifest, ModelSource};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use jangle_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory the demo looks for its model in when nothing else is configured
pub const DEFAULT_MODEL_DIR: &str = "models/jangle";

/// Manifest file name inside a model directory
pub const MANIFEST_FILE: &str = "model.yaml";

/// Loads an [`ImagePredictor`] from a model directory
#[derive(Debug, Clone)]
pub struct ModelLoader {
    model_dir: PathBuf,
}

impl ModelLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.model_dir.join(MANIFEST_FILE)
    }

    /// Read and validate the manifest without touching the weights
    pub fn load_manifest(&self) -> Result<ModelManifest> {
        if !self.model_dir.is_dir() {
            return Err(Error::model(format!(
                "Model directory does not exist: {}",
                self.model_dir.display()
            )));
        }

        let manifest = ModelManifest::from_file(self.manifest_path())?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load the manifest, resolve and map the weights, and build the predictor
    pub fn load(&self) -> Result<ImagePredictor> {
        let manifest = self.load_manifest()?;

        tracing::info!(
            "Loading model '{}' ({}) from {}",
            manifest.name,
            manifest.architecture,
            self.model_dir.display()
        );

        let weights_path = self.resolve_weights(&manifest)?;
        let device = create_device(manifest.device_type()?)?;

        // SAFETY: the weights file is mapped read-only and not modified while the process runs.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device).map_err(
                |e| {
                    Error::model(format!(
                        "Failed to load weights {}: {}",
                        weights_path.display(),
                        e
                    ))
                },
            )?
        };

        let predictor = ImagePredictor::from_var_builder(
            manifest.name.clone(),
            manifest.architecture,
            manifest.labels.clone(),
            manifest.preprocessing.clone(),
            vb,
            device,
        )?;

        tracing::info!(
            "Model '{}' ready with labels {:?}",
            manifest.name,
            manifest.labels.labels()
        );

        Ok(predictor)
    }

    /// Resolve the weights file (download if needed)
    pub fn resolve_weights(&self, manifest: &ModelManifest) -> Result<PathBuf> {
        match &manifest.source {
            ModelSource::Local { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.model_dir.join(path)
                };
                if !path.is_file() {
                    return Err(Error::model(format!(
                        "Model weights not found: {}",
                        path.display()
                    )));
                }
                Ok(path)
            }
            ModelSource::HuggingFace {
                repo,
                revision,
                filename,
            } => download_from_huggingface(repo, revision, filename),
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

/// Download weights from HuggingFace Hub into its local cache
fn download_from_huggingface(repo: &str, revision: &str, filename: &str) -> Result<PathBuf> {
    tracing::info!("Downloading {} from HuggingFace: {} @ {}", filename, repo, revision);

    let api = Api::new()
        .map_err(|e| Error::model(format!("Failed to initialize HuggingFace API: {}", e)))?;

    let repo_obj = api.repo(Repo::with_revision(
        repo.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let path = repo_obj
        .get(filename)
        .map_err(|e| Error::model(format!("Failed to download {} from {}: {}", filename, repo, e)))?;

    tracing::info!("Weights cached at: {}", path.display());
    Ok(path)
}

/// Create Candle device from device type
pub fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx)
            .map_err(|e| Error::model(format!("Failed to create CUDA device: {}", e))),
        DeviceType::Metal(idx) => Device::new_metal(idx)
            .map_err(|e| Error::model(format!("Failed to create Metal device: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, body: &str) {
        std::fs::write(dir.join(MANIFEST_FILE), body).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let loader = ModelLoader::new("/definitely/not/here/jangle");
        let err = loader.load().unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new(dir.path()).load_manifest().unwrap_err();
        assert!(err.to_string().contains("model.yaml"));
    }

    #[test]
    fn test_corrupt_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), "architecture: [this is: not valid");
        let err = ModelLoader::new(dir.path()).load_manifest().unwrap_err();
        assert!(matches!(err, Error::Manifest(_)));
    }

    #[test]
    fn test_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "architecture: resnet18\nlabels: [durian, inedible, non_durian_edible]\n",
        );

        let loader = ModelLoader::new(dir.path());
        let manifest = loader.load_manifest().unwrap();
        let err = loader.resolve_weights(&manifest).unwrap_err();
        assert!(err.to_string().contains("weights not found"));
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_corrupt_weights() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "architecture: resnet18\nlabels: [durian, inedible, non_durian_edible]\n",
        );
        std::fs::write(dir.path().join("model.safetensors"), b"not safetensors").unwrap();

        let err = ModelLoader::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("Failed to load weights"));
    }

    #[test]
    fn test_wrong_vocabulary_rejected_before_weights() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            "architecture: resnet18\nlabels: [cat, dog, inedible]\n",
        );

        let err = ModelLoader::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, Error::Vocabulary(_)));
    }

    #[test]
    fn test_absolute_weights_path() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("elsewhere.safetensors");
        std::fs::write(&weights, b"x").unwrap();
        write_manifest(
            dir.path(),
            &format!(
                "source:\n  type: local\n  path: {:?}\narchitecture: resnet18\nlabels: [durian, inedible, non_durian_edible]\n",
                weights
            ),
        );

        let loader = ModelLoader::new(dir.path());
        let manifest = loader.load_manifest().unwrap();
        assert_eq!(loader.resolve_weights(&manifest).unwrap(), weights);
    }

    #[test]
    fn test_cpu_device() {
        assert!(matches!(create_device(DeviceType::Cpu).unwrap(), Device::Cpu));
    }
}
