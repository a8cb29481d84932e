//! Fraud Prediction Client - Main Entry Point
//!
//! One-shot subcommands for single, batch and generate-then-predict, plus
//! an interactive console.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraud_prediction_client::{
    config::{AppConfig, LoggingConfig},
    console, PredictionClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fraud-client", version, about = "Submit transactions to a fraud-scoring service")]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override backend.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a single transaction
    Predict {
        /// Transaction as JSON text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        json: Option<String>,
        /// File holding the transaction JSON object
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Score a JSON array of transactions in one request
    Batch {
        #[arg(long)]
        file: PathBuf,
    },
    /// Have the backend synthesize transactions, then score them
    Generate {
        /// Number of transactions; missing or non-positive means 10
        #[arg(long, allow_negative_numbers = true)]
        count: Option<i64>,
    },
    /// Interactive console
    Console,
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "fraud_prediction_client={level},fraud_client={level}",
            level = logging.level
        ))
        .with_context(|| format!("Invalid log level: {}", logging.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.backend.base_url = base_url;
        config.validate()?;
    }

    init_logging(&config.logging)?;
    info!(base_url = %config.backend.base_url, "Configuration loaded");

    let client = PredictionClient::from_config(&config)?;

    match cli.command {
        Command::Predict { json, file } => {
            let text = match (json, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("predict needs --json or --file"),
            };
            let result = client
                .predict_single_text(&text)
                .await
                .context("Single prediction failed")?;
            if let Some(score) = result.score() {
                println!("{score}");
            }
            println!("{result}");
        }
        Command::Batch { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let result = client
                .predict_batch_text(&text)
                .await
                .context("Batch prediction failed")?;
            println!("{result}");
        }
        Command::Generate { count } => {
            let result = client
                .generate_then_predict(count)
                .await
                .context("Generate-then-predict failed")?;
            println!("{result}");
        }
        Command::Console => {
            console::run(Arc::new(client)).await?;
        }
    }

    Ok(())
}
