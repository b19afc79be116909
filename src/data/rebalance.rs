//! Minority-class oversampling via nearest-neighbor interpolation
//!
//! Applied to the training partition only, after the split: synthesizing
//! rows before splitting would place interpolated neighbors on both sides
//! of the train/test boundary and invalidate the evaluation.

use crate::data::Dataset;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// Oversample the minority class until both classes are balanced.
///
/// Each synthetic row interpolates between a random minority row and one of
/// its `k_neighbors` nearest minority neighbors (Euclidean distance), with
/// a uniform gap in [0, 1). Deterministic for a given seed. Original rows
/// are preserved unchanged, with synthetic rows appended after them.
pub fn smote_rebalance(train: &Dataset, k_neighbors: usize, seed: u64) -> Dataset {
    let positive: Vec<usize> = (0..train.n_samples())
        .filter(|&i| train.labels[i] > 0.5)
        .collect();
    let negative: Vec<usize> = (0..train.n_samples())
        .filter(|&i| train.labels[i] <= 0.5)
        .collect();

    let (minority, majority, minority_label) = if positive.len() <= negative.len() {
        (positive, negative, 1.0)
    } else {
        (negative, positive, 0.0)
    };

    let mut balanced = train.clone();

    if minority.is_empty() {
        warn!("training partition has a single class; skipping rebalance");
        return balanced;
    }

    let needed = majority.len().saturating_sub(minority.len());
    if needed == 0 {
        return balanced;
    }

    let neighbors = nearest_neighbors(train, &minority, k_neighbors);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for _ in 0..needed {
        let base_pos = rng.gen_range(0..minority.len());
        let base = &train.features[minority[base_pos]];

        let candidates = &neighbors[base_pos];
        let synthetic = if candidates.is_empty() {
            // Lone minority row: nothing to interpolate toward
            base.clone()
        } else {
            let neighbor_idx = candidates[rng.gen_range(0..candidates.len())];
            let neighbor = &train.features[neighbor_idx];
            let gap: f64 = rng.gen();
            base.iter()
                .zip(neighbor.iter())
                .map(|(&b, &n)| b + gap * (n - b))
                .collect()
        };

        balanced.add_sample(synthetic, minority_label);
    }

    info!(
        synthesized = needed,
        class_size = majority.len(),
        "rebalanced training partition"
    );

    balanced
}

/// For each minority row, the dataset indices of its k nearest minority
/// neighbors (excluding itself), closest first.
fn nearest_neighbors(dataset: &Dataset, minority: &[usize], k: usize) -> Vec<Vec<usize>> {
    minority
        .iter()
        .map(|&i| {
            let mut distances: Vec<(usize, f64)> = minority
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (j, squared_distance(&dataset.features[i], &dataset.features[j])))
                .collect();
            distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            distances.truncate(k);
            distances.into_iter().map(|(j, _)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_train() -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string(), "y".to_string()]);
        for i in 0..20 {
            dataset.add_sample(vec![i as f64, -1.0], 0.0);
        }
        dataset.add_sample(vec![100.0, 1.0], 1.0);
        dataset.add_sample(vec![101.0, 1.2], 1.0);
        dataset.add_sample(vec![102.0, 0.8], 1.0);
        dataset
    }

    #[test]
    fn test_classes_are_balanced() {
        let train = imbalanced_train();
        let balanced = smote_rebalance(&train, 5, 42);

        let positive = balanced.n_positive();
        let negative = balanced.n_samples() - positive;
        assert_eq!(positive, negative);
        assert_eq!(balanced.n_samples(), 40);
    }

    #[test]
    fn test_original_rows_preserved_in_place() {
        let train = imbalanced_train();
        let balanced = smote_rebalance(&train, 5, 42);

        for i in 0..train.n_samples() {
            assert_eq!(balanced.features[i], train.features[i]);
            assert_eq!(balanced.labels[i], train.labels[i]);
        }
    }

    #[test]
    fn test_synthetic_rows_lie_between_minority_neighbors() {
        let train = imbalanced_train();
        let balanced = smote_rebalance(&train, 5, 42);

        for i in train.n_samples()..balanced.n_samples() {
            assert_eq!(balanced.labels[i], 1.0);
            let x = balanced.features[i][0];
            assert!((100.0..=102.0).contains(&x), "x = {x} outside minority hull");
        }
    }

    #[test]
    fn test_deterministic_per_seed() {
        let train = imbalanced_train();
        let first = smote_rebalance(&train, 5, 9);
        let second = smote_rebalance(&train, 5, 9);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_minority_row_is_duplicated() {
        let mut train = Dataset::new(vec!["x".to_string()]);
        for i in 0..4 {
            train.add_sample(vec![i as f64], 0.0);
        }
        train.add_sample(vec![50.0], 1.0);

        let balanced = smote_rebalance(&train, 5, 42);
        assert_eq!(balanced.n_positive(), 4);
        for i in train.n_samples()..balanced.n_samples() {
            assert_eq!(balanced.features[i], vec![50.0]);
        }
    }

    #[test]
    fn test_single_class_partition_unchanged() {
        let mut train = Dataset::new(vec!["x".to_string()]);
        for i in 0..4 {
            train.add_sample(vec![i as f64], 0.0);
        }

        let balanced = smote_rebalance(&train, 5, 42);
        assert_eq!(balanced, train);
    }
}
