//! Transaction record presented to the pipeline for scoring

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single credit-card transaction: a mapping from feature name to value.
///
/// The dataset's feature columns are `Time`, `V1`..`V28` and `Amount`;
/// `Time` and `Amount` are raw-scale and must always be present — the
/// scaler and the inference engine reject records without them instead of
/// substituting defaults. The label column is never part of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRecord {
    values: BTreeMap<String, f64>,
}

impl TransactionRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Build a record from (name, value) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Set a feature value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Look up a feature value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Look up a feature value, failing with `MissingFeature` if absent.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| PipelineError::MissingFeature(name.to_string()))
    }

    /// Whether the record carries the named feature.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove a feature, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    /// Number of features in the record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Assemble the feature vector in the given column order.
    ///
    /// Fails with `MissingFeature` on the first absent column, before any
    /// value is produced.
    pub fn to_vector(&self, feature_names: &[String]) -> Result<Vec<f64>> {
        feature_names
            .iter()
            .map(|name| self.require(name))
            .collect()
    }

    /// Example transaction for ad-hoc inference runs: one day into the
    /// capture window, a 100.00 charge, and small decorrelated components.
    pub fn example() -> Self {
        let mut record = Self::new();
        record.set("Time", 86_400.0);
        for i in 1..=28u32 {
            let magnitude = f64::from(i) / 10.0;
            let value = if i % 2 == 0 { -magnitude } else { magnitude };
            record.set(format!("V{i}"), value);
        }
        record.set("Amount", 100.0);
        record
    }
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self::new()
    }
}
