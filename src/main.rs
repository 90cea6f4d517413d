//! Model Committee - Main Entry Point
//!
//! Replays a recorded session through the committee: builds the predictor
//! registry from configuration, runs the selected predictors and prints the
//! consensus report.

use anyhow::{Context, Result};
use clap::Parser;
use model_committee::{
    config::AppConfig, metrics::CommitteeMetrics, models::PredictorRegistry,
    session::ReplaySession, CommitteeEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "committee")]
#[command(about = "Run a committee of pretrained models and report their consensus")]
#[command(version)]
struct Args {
    /// Recorded session (task input plus per-model outputs)
    #[arg(short, long)]
    session: PathBuf,

    /// Configuration file
    #[arg(short, long, default_value = "config/config.toml", env = "COMMITTEE_CONFIG")]
    config: PathBuf,

    /// Model to include in the committee (repeatable; defaults to the configured selection)
    #[arg(long = "select", value_name = "MODEL")]
    select: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if args.config.exists() {
        AppConfig::load_from_path(&args.config)?
    } else {
        AppConfig::default()
    };

    init_logging(&config.logging.level, &config.logging.format)?;
    if !args.config.exists() {
        warn!(path = %args.config.display(), "Configuration file not found, using defaults");
    }

    let session = ReplaySession::load(&args.session)?;
    let task = session.task();
    info!(task = %task, session = %args.session.display(), "Session loaded");

    // Build predictors for every configured model that has a recording
    let registry = PredictorRegistry::from_config(&config.models, |task, spec| {
        session.predictor_for(task, spec)
    });

    let metrics = Arc::new(CommitteeMetrics::new());
    let engine = CommitteeEngine::new(registry, &config.committee).with_metrics(metrics.clone());

    let input = session.input.clone();
    let report = if args.select.is_empty() {
        engine.evaluate_default(input).await
    } else {
        engine.evaluate(input, args.select.as_slice()).await
    };

    metrics.print_summary();

    let report = report.context("Committee could not reach a consensus")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}
