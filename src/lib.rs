//! Credit-Card Fraud Batch Pipeline
//!
//! A batch pipeline for detecting fraudulent credit-card transactions:
//! preprocess (fit and apply a scaler on the raw corpus), train (stratified
//! split, minority oversampling, random forest), evaluate (held-out
//! metrics) and infer (score a single transaction). The scaler fitted at
//! preprocessing time is persisted and re-applied unchanged at inference
//! time, keeping the training and inference transforms identical.

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod pipeline;
pub mod scaler;
pub mod types;

pub use config::PipelineConfig;
pub use data::Dataset;
pub use error::{PipelineError, Result};
pub use evaluation::EvaluationReport;
pub use models::inference::InferenceEngine;
pub use models::{ArtifactStore, RandomForest};
pub use pipeline::{Pipeline, PipelineReport};
pub use scaler::StandardScaler;
pub use types::{Prediction, TransactionRecord, Verdict};
