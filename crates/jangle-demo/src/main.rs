use anyhow::Context;
use clap::Parser;
use jangle_classifier::{ImagePredictor, ModelLoader, PredictionHandler};
use jangle_demo::cli::{Cli, Commands};
use jangle_demo::config::DemoConfig;
use jangle_demo::server::run_server;
use jangle_demo::state::AppState;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_logging(args.verbose);

            let config = DemoConfig::load(&args.config, &args)?;
            let addr = config.socket_addr()?;

            let metrics = if config.metrics {
                Some(init_metrics()?)
            } else {
                None
            };

            let predictor = load_predictor(config.model_dir.clone()).await?;
            let architecture = predictor.architecture();
            let handler = PredictionHandler::new(Arc::new(predictor));
            let state = AppState::new(config.clone(), handler, metrics)?;

            println!();
            println!("  {}", config.title);
            println!();
            println!("  Model:   {} ({})", state.handler.predictor().name(), architecture);
            println!("  Labels:  {:?}", state.handler.vocabulary().labels());
            println!();
            println!("  Open http://{} in your browser", addr);
            println!();

            run_server(state, addr).await?;
        }

        Commands::Predict {
            image,
            model_dir,
            verbose,
        } => {
            init_logging(verbose);

            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;

            let predictor = load_predictor(model_dir).await?;
            let handler = PredictionHandler::new(Arc::new(predictor));

            let outcome = handler.handle(Some(&bytes)).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

/// Load the model once; failure aborts startup
async fn load_predictor(model_dir: PathBuf) -> anyhow::Result<ImagePredictor> {
    let dir = model_dir.clone();
    tokio::task::spawn_blocking(move || ModelLoader::new(dir).load())
        .await
        .context("Model loading task failed")?
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "jangle_demo=debug,jangle_classifier=debug,tower_http=debug"
    } else {
        "jangle_demo=info,jangle_classifier=info,tower_http=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "jangle_predictions_total",
        "Total number of classified images by predicted class"
    );
    metrics::describe_counter!(
        "jangle_prediction_errors_total",
        "Total number of uploads that could not be classified"
    );
    metrics::describe_counter!(
        "jangle_empty_requests_total",
        "Total number of requests without an image"
    );
    metrics::describe_counter!(
        "jangle_fetch_errors_total",
        "Total number of failed image URL fetches"
    );
    metrics::describe_histogram!(
        "jangle_prediction_latency_us",
        metrics::Unit::Microseconds,
        "Decode and inference latency in microseconds"
    );

    tracing::info!("Metrics exporter initialized");
    Ok(handle)
}
