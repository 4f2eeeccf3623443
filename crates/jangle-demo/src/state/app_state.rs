use crate::config::DemoConfig;
use jangle_classifier::PredictionHandler;
use jangle_core::Vocabulary;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Demo configuration, fixed at startup
    pub config: Arc<DemoConfig>,

    /// Prediction handler wrapping the loaded model
    pub handler: PredictionHandler,

    /// Client used to fetch images by URL
    pub http: reqwest::Client,

    /// Prometheus renderer (when metrics are enabled)
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: DemoConfig,
        handler: PredictionHandler,
        metrics: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("jangle-demo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            handler,
            http,
            metrics,
        })
    }

    /// Page and model details for the UI
    pub fn info(&self) -> DemoInfo {
        let predictor = self.handler.predictor();
        DemoInfo {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            model: predictor.name().to_string(),
            vocabulary: predictor.vocabulary().clone(),
            max_upload_bytes: self.config.max_upload_bytes,
        }
    }
}

/// Response body of `/api/info`
#[derive(Debug, Clone, Serialize)]
pub struct DemoInfo {
    pub title: String,
    pub description: String,
    pub model: String,
    pub vocabulary: Vocabulary,
    pub max_upload_bytes: usize,
}
