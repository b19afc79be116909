//! Fraud Batch Pipeline - Main Entry Point
//!
//! One subcommand per pipeline stage, plus `run` to execute the whole
//! Preprocess → Train → Evaluate → Infer sequence and write the verdict
//! artifact.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fraud_batch_pipeline::{Pipeline, PipelineConfig, TransactionRecord};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch credit-card fraud detection pipeline")]
struct Cli {
    /// Configuration file (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the scaler on the raw corpus and write the preprocessed CSV
    Preprocess,
    /// Split, rebalance the training partition and fit the classifier
    Train,
    /// Score the held-out partition and print the metrics report
    Evaluate,
    /// Score a single transaction
    Infer {
        /// JSON file mapping feature names to values; the bundled example
        /// transaction is scored when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run every stage in order and write the verdict artifact
    Run {
        /// JSON file mapping feature names to values; the bundled example
        /// transaction is scored when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from_path(path)?,
        None => PipelineConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("fraud_batch_pipeline={}", config.logging.level).parse()?),
        )
        .init();

    info!("Starting Fraud Batch Pipeline");
    let pipeline = Pipeline::new(config);

    match cli.command {
        Command::Preprocess => {
            pipeline.preprocess()?;
            println!("Preprocessing complete.");
        }
        Command::Train => {
            pipeline.train()?;
            println!("Model training complete.");
        }
        Command::Evaluate => {
            let report = pipeline.evaluate()?;
            println!("{report}");
        }
        Command::Infer { input } => {
            let record = load_record(input.as_deref())?;
            let prediction = pipeline.infer(&record)?;
            println!("Fraud probability: {:.4}", prediction.probability);
            println!("Result: {}", prediction.verdict);
        }
        Command::Run { input } => {
            let record = load_record(input.as_deref())?;
            let report = pipeline.run(&record)?;
            println!("{}", report.evaluation);
            println!();
            println!("Fraud probability: {:.4}", report.prediction.probability);
            println!("Inference Result: {}", report.verdict);
        }
    }

    Ok(())
}

/// Read a transaction from a JSON file, or fall back to the bundled
/// example transaction.
fn load_record(path: Option<&Path>) -> Result<TransactionRecord> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read transaction from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse transaction JSON in {}", path.display()))
        }
        None => {
            info!("no input record supplied; scoring the bundled example transaction");
            Ok(TransactionRecord::example())
        }
    }
}
