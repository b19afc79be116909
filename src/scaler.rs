//! Standardization of the two raw-scale features.
//!
//! `Time` and `Amount` arrive on their natural scales while the remaining
//! columns are already decorrelated components; only those two are scaled.
//! The scaler is fitted exactly once, on the original full corpus before
//! any rebalancing or splitting, and every downstream consumer applies the
//! persisted statistics without refitting — training and inference must
//! see the identical transform.

use crate::data::Dataset;
use crate::error::{PipelineError, Result};
use crate::types::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The distinguished raw-scale feature columns.
pub const RAW_SCALE_FEATURES: [&str; 2] = ["Time", "Amount"];

/// Location/scale statistics for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl FeatureStats {
    /// Divisor used for scaling; a constant column keeps its centered
    /// values instead of dividing by zero.
    fn effective_std(&self) -> f64 {
        if self.std_dev > 1e-12 {
            self.std_dev
        } else {
            1.0
        }
    }
}

/// Fitted z-score transform over the raw-scale features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    stats: BTreeMap<String, FeatureStats>,
}

impl StandardScaler {
    /// Fit mean and standard deviation of each raw-scale feature across
    /// the entire corpus.
    ///
    /// Fails with `MissingFeature` if the dataset lacks one of the
    /// distinguished columns.
    pub fn fit(dataset: &Dataset) -> Result<Self> {
        let mut stats = BTreeMap::new();

        for name in RAW_SCALE_FEATURES {
            let column = dataset
                .column_index(name)
                .ok_or_else(|| PipelineError::MissingFeature(name.to_string()))?;

            let n = dataset.n_samples() as f64;
            if n == 0.0 {
                return Err(PipelineError::MalformedDataset(
                    "cannot fit a scaler on an empty dataset".to_string(),
                ));
            }

            let values = dataset.features.iter().map(|row| row[column]);
            let mean = values.clone().sum::<f64>() / n;
            let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;

            stats.insert(
                name.to_string(),
                FeatureStats {
                    mean,
                    std_dev: variance.sqrt(),
                },
            );
        }

        Ok(Self { stats })
    }

    /// Statistics for one feature, if it is scaled by this transform.
    pub fn stats(&self, name: &str) -> Option<&FeatureStats> {
        self.stats.get(name)
    }

    fn scale(stats: &FeatureStats, value: f64) -> f64 {
        (value - stats.mean) / stats.effective_std()
    }

    fn unscale(stats: &FeatureStats, value: f64) -> f64 {
        value * stats.effective_std() + stats.mean
    }

    /// Scale the raw-scale features of a record, leaving every other
    /// feature untouched. Pure: no state is read beyond the fitted
    /// statistics and nothing is mutated.
    ///
    /// Fails with `MissingFeature` before producing any output if a
    /// distinguished feature is absent.
    pub fn transform_record(&self, record: &TransactionRecord) -> Result<TransactionRecord> {
        // Every raw-scale feature is validated before any output exists
        let mut scaled = Vec::with_capacity(self.stats.len());
        for (name, stats) in &self.stats {
            let raw = record.require(name)?;
            scaled.push((name.clone(), Self::scale(stats, raw)));
        }

        let mut transformed = record.clone();
        for (name, value) in scaled {
            transformed.set(name, value);
        }
        Ok(transformed)
    }

    /// Invert `transform_record`, recovering raw-scale values.
    pub fn inverse_record(&self, record: &TransactionRecord) -> Result<TransactionRecord> {
        let mut unscaled = Vec::with_capacity(self.stats.len());
        for (name, stats) in &self.stats {
            let scaled = record.require(name)?;
            unscaled.push((name.clone(), Self::unscale(stats, scaled)));
        }

        let mut raw = record.clone();
        for (name, value) in unscaled {
            raw.set(name, value);
        }
        Ok(raw)
    }

    /// Scale the raw-scale columns of a whole table.
    pub fn transform_dataset(&self, dataset: &Dataset) -> Result<Dataset> {
        let mut columns = Vec::with_capacity(self.stats.len());
        for (name, stats) in &self.stats {
            let index = dataset
                .column_index(name)
                .ok_or_else(|| PipelineError::MissingFeature(name.clone()))?;
            columns.push((index, stats));
        }

        let mut transformed = dataset.clone();
        for row in &mut transformed.features {
            for &(index, stats) in &columns {
                row[index] = Self::scale(stats, row[index]);
            }
        }
        Ok(transformed)
    }
}
