//! Demo server configuration

use crate::cli::ServeArgs;
use anyhow::Context;
use jangle_classifier::DEFAULT_MODEL_DIR;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Demo server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model directory (manifest + weights)
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Largest accepted upload
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Page title shown by the UI
    #[serde(default = "default_title")]
    pub title: String,

    /// Page description shown by the UI
    #[serde(default = "default_description")]
    pub description: String,

    /// Expose Prometheus metrics on /metrics
    #[serde(default = "default_true")]
    pub metrics: bool,

    /// Timeout for fetching images by URL
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl DemoConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &ServeArgs) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path))?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model_dir) = &cli.model_dir {
            config.model_dir = model_dir.clone();
        }

        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if cli.no_metrics {
            config.metrics = false;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.listen, self.port))
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            model_dir: default_model_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            title: default_title(),
            description: default_description(),
            metrics: true,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_DIR)
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_title() -> String {
    "Will Jangle Eat This? 🤔".to_string()
}

fn default_description() -> String {
    "Upload an image to see if Jangle (who eats almost anything except durian) would consume it!"
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = DemoConfig::load("/no/such/jangle.yaml", &ServeArgs::default()).unwrap();
        assert_eq!(config.port, 7860);
        assert_eq!(config.model_dir, PathBuf::from("models/jangle"));
        assert!(config.metrics);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:7860");
    }

    #[test]
    fn test_file_then_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jangle.yaml");
        std::fs::write(
            &path,
            "port: 8080\nmodel_dir: /opt/jangle\nmax_upload_bytes: 1024\ntitle: Snack Check\n",
        )
        .unwrap();

        let args = ServeArgs {
            port: Some(9090),
            no_metrics: true,
            ..Default::default()
        };
        let config = DemoConfig::load(path.to_str().unwrap(), &args).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.model_dir, PathBuf::from("/opt/jangle"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.title, "Snack Check");
        assert!(!config.metrics);
        assert!(config.description.contains("durian"));
    }

    #[test]
    fn test_bad_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jangle.yaml");
        std::fs::write(&path, "port: [not a port").unwrap();

        assert!(DemoConfig::load(path.to_str().unwrap(), &ServeArgs::default()).is_err());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = DemoConfig {
            listen: "not an address".to_string(),
            ..Default::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
