use clap::{Args, Parser, Subcommand};
use jangle_classifier::DEFAULT_MODEL_DIR;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jangle-demo")]
#[command(author, version, about = "Will Jangle eat this? Image classifier demo")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the demo server with web UI
    Serve(ServeArgs),

    /// Classify a single image file and print the verdict as JSON
    Predict {
        /// Image file to classify
        image: PathBuf,

        /// Model directory (manifest + weights)
        #[arg(short, long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Flags for `serve`; anything set here overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "jangle.yaml")]
    pub config: String,

    /// Model directory (manifest + weights)
    #[arg(short, long, env = "JANGLE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Disable the Prometheus /metrics endpoint
    #[arg(long)]
    pub no_metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "jangle-demo",
            "serve",
            "--port",
            "9000",
            "--model-dir",
            "/srv/models/jangle",
            "--no-metrics",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(9000));
                assert_eq!(args.model_dir, Some(PathBuf::from("/srv/models/jangle")));
                assert_eq!(args.config, "jangle.yaml");
                assert!(args.no_metrics);
                assert!(args.listen.is_none());
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from(["jangle-demo", "predict", "durian.jpg"]).unwrap();
        match cli.command {
            Commands::Predict {
                image, model_dir, ..
            } => {
                assert_eq!(image, PathBuf::from("durian.jpg"));
                assert_eq!(model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
            }
            _ => panic!("Expected predict command"),
        }
    }
}
