//! Configuration management for the fraud detection pipeline
//!
//! Every stage receives its paths and parameters from this struct; nothing
//! in the pipeline derives a location from the process working directory.

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the raw dataset and every derived artifact
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Raw labeled transaction CSV
    pub dataset: PathBuf,
    /// Scaled corpus written by the preprocess stage
    pub preprocessed: PathBuf,
    /// Persisted scaler statistics
    pub scaler: PathBuf,
    /// Persisted trained model
    pub model: PathBuf,
    /// Persisted train/test split indices
    pub split_manifest: PathBuf,
    /// Single-line verdict written after a full run
    pub verdict: PathBuf,
}

/// Train/test partition parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    /// Fraction of the corpus held out for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for the stratified shuffle
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Minority-class oversampling parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceConfig {
    /// Neighbors considered when interpolating synthetic samples
    #[serde(default = "default_k_neighbors")]
    pub k_neighbors: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Random forest parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Features considered per split; sqrt of the total when absent
    #[serde(default)]
    pub max_features: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// Decision threshold configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Fraud iff probability >= threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_k_neighbors() -> usize {
    5
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    12
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    2
}

fn default_threshold() -> f64 {
    crate::types::DEFAULT_FRAUD_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PipelineConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/pipeline.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Default configuration rooted at a working directory.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            paths: PathsConfig {
                dataset: root.join("data/creditcard.csv"),
                preprocessed: root.join("artifacts/preprocessed.csv"),
                scaler: root.join("artifacts/scaler.json"),
                model: root.join("artifacts/model.json"),
                split_manifest: root.join("artifacts/split.json"),
                verdict: root.join("artifacts/verdict.txt"),
            },
            split: SplitConfig::default(),
            rebalance: RebalanceConfig::default(),
            training: TrainingConfig::default(),
            detection: DetectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_root(".")
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            k_neighbors: default_k_neighbors(),
            seed: default_seed(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
            seed: default_seed(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.split.test_fraction, 0.2);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.detection.threshold, 0.5);
        assert_eq!(config.training.n_trees, 100);
        assert!(config.paths.dataset.ends_with("data/creditcard.csv"));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[paths]
dataset = "data/creditcard.csv"
preprocessed = "artifacts/preprocessed.csv"
scaler = "artifacts/scaler.json"
model = "artifacts/model.json"
split_manifest = "artifacts/split.json"
verdict = "artifacts/verdict.txt"

[split]
test_fraction = 0.25
seed = 7

[training]
n_trees = 10
"#
        )
        .unwrap();

        let config = PipelineConfig::load_from_path(&path).unwrap();
        assert_eq!(config.split.test_fraction, 0.25);
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.training.n_trees, 10);
        // Unspecified sections fall back to defaults
        assert_eq!(config.detection.threshold, 0.5);
        assert_eq!(config.rebalance.k_neighbors, 5);
    }
}
