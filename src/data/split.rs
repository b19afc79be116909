//! Deterministic stratified train/test partitioning

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Index sets of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Persisted record of the partition actually used at training time.
///
/// The evaluator prefers these indices over regenerating the split from
/// (seed, fraction): if the dataset were reordered or edited between runs,
/// a parameter-only reconstruction would silently evaluate on rows the
/// trainer saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    pub seed: u64,
    pub test_fraction: f64,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitManifest {
    pub fn new(seed: u64, test_fraction: f64, indices: &SplitIndices) -> Self {
        Self {
            seed,
            test_fraction,
            train: indices.train.clone(),
            test: indices.test.clone(),
        }
    }

    pub fn indices(&self) -> SplitIndices {
        SplitIndices {
            train: self.train.clone(),
            test: self.test.clone(),
        }
    }

    /// Check the manifest still fits a dataset of `n_samples` rows.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        let max = self.train.iter().chain(self.test.iter()).max().copied();
        match max {
            Some(max) if max >= n_samples => Err(PipelineError::MalformedDataset(format!(
                "split manifest references row {max} but the dataset has {n_samples} rows; \
                 the dataset changed since training"
            ))),
            _ => Ok(()),
        }
    }
}

/// Stratified random partition of `labels` into train/test index sets.
///
/// Rows are grouped per class, each group is shuffled with a ChaCha stream
/// seeded from `seed`, and `test_fraction` of each group (rounded) goes to
/// the test side, so the fraud ratio of each partition tracks the corpus.
/// Identical (labels, test_fraction, seed) always produce the identical
/// partition; both index sets come back sorted.
pub fn stratified_split(labels: &[f64], test_fraction: f64, seed: u64) -> SplitIndices {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut negative: Vec<usize> = Vec::new();
    let mut positive: Vec<usize> = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        if label > 0.5 {
            positive.push(i);
        } else {
            negative.push(i);
        }
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    // Negative class first, then positive: fixed order keeps the RNG
    // stream, and therefore the partition, reproducible.
    for group in [&mut negative, &mut positive] {
        group.shuffle(&mut rng);
        let n_test = ((test_fraction * group.len() as f64).round() as usize).min(group.len());
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    SplitIndices { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_labels(n_negative: usize, n_positive: usize) -> Vec<f64> {
        let mut labels = vec![0.0; n_negative];
        labels.extend(vec![1.0; n_positive]);
        labels
    }

    #[test]
    fn test_split_is_deterministic() {
        let labels = imbalanced_labels(95, 5);

        let first = stratified_split(&labels, 0.2, 42);
        let second = stratified_split(&labels, 0.2, 42);

        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let labels = imbalanced_labels(95, 5);

        let first = stratified_split(&labels, 0.2, 42);
        let second = stratified_split(&labels, 0.2, 43);

        assert_ne!(first, second);
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover() {
        let labels = imbalanced_labels(90, 10);
        let split = stratified_split(&labels, 0.3, 7);

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        let expected: Vec<usize> = (0..labels.len()).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_stratification_preserves_fraud_rate() {
        let labels = imbalanced_labels(900, 100);
        let split = stratified_split(&labels, 0.2, 42);

        let test_positive = split.test.iter().filter(|&&i| labels[i] > 0.5).count();
        let test_rate = test_positive as f64 / split.test.len() as f64;
        // Corpus rate is 0.10; per-class rounding keeps the partitions close
        assert!((test_rate - 0.10).abs() < 0.02);

        let train_positive = split.train.iter().filter(|&&i| labels[i] > 0.5).count();
        let train_rate = train_positive as f64 / split.train.len() as f64;
        assert!((train_rate - 0.10).abs() < 0.02);
    }

    #[test]
    fn test_manifest_round_trip_and_validation() {
        let labels = imbalanced_labels(8, 2);
        let split = stratified_split(&labels, 0.2, 1);
        let manifest = SplitManifest::new(1, 0.2, &split);

        let json = serde_json::to_string(&manifest).unwrap();
        let loaded: SplitManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.indices(), split);

        assert!(loaded.validate(10).is_ok());
        assert!(loaded.validate(3).is_err());
    }
}
