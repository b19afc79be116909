//! CART-style decision tree for binary fraud classification

use crate::data::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of the tree
    pub max_depth: usize,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    /// Seed for the feature-subsampling stream
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of fraud rows that reached this leaf
        fraud_probability: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Fit the tree on a labeled dataset.
    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_importances = vec![0.0; dataset.n_features()];

        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(dataset, &indices, 0, &mut rng));

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for importance in &mut self.feature_importances {
                *importance /= sum;
            }
        }
    }

    fn build(
        &mut self,
        dataset: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let impurity = gini(dataset, indices);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return self.leaf(dataset, indices);
        }

        match self.find_best_split(dataset, indices, impurity, rng) {
            Some(split) => {
                if split.left.len() < self.config.min_samples_leaf
                    || split.right.len() < self.config.min_samples_leaf
                {
                    return self.leaf(dataset, indices);
                }

                self.feature_importances[split.feature] += split.gain * indices.len() as f64;

                let left = self.build(dataset, &split.left, depth + 1, rng);
                let right = self.build(dataset, &split.right, depth + 1, rng);

                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => self.leaf(dataset, indices),
        }
    }

    fn leaf(&self, dataset: &Dataset, indices: &[usize]) -> Node {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| dataset.labels[i] > 0.5).count();
        let fraud_probability = if n == 0 {
            0.5
        } else {
            positives as f64 / n as f64
        };
        Node::Leaf {
            fraud_probability,
            n_samples: n,
        }
    }

    fn find_best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = dataset.n_features();
        let max_features = self.config.max_features.unwrap_or(n_features).min(n_features);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);

        let mut best: Option<BestSplit> = None;

        for &feature in &candidates {
            let mut values: Vec<f64> = indices
                .iter()
                .map(|&i| dataset.features[i][feature])
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| dataset.features[i][feature] <= threshold);

                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let n_left = left.len() as f64;
                let n_right = right.len() as f64;
                let weighted = (n_left * gini(dataset, &left)
                    + n_right * gini(dataset, &right))
                    / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map(|b| b.gain).unwrap_or(0.0) {
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                        left,
                        right,
                    });
                }
            }
        }

        best
    }

    /// Fraud probability for a single feature vector.
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(node) => node,
            None => return 0.5,
        };

        loop {
            match node {
                Node::Leaf {
                    fraud_probability, ..
                } => return *fraud_probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Per-feature normalized impurity reduction.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Gini impurity of the binary labels selected by `indices`.
fn gini(dataset: &Dataset, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let n = indices.len() as f64;
    let positives = indices.iter().filter(|&&i| dataset.labels[i] > 0.5).count() as f64;
    let p = positives / n;
    2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset() -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        for i in 0..100 {
            let x = i as f64 / 10.0;
            let label = if x > 5.0 { 1.0 } else { 0.0 };
            dataset.add_sample(vec![x], label);
        }
        dataset
    }

    #[test]
    fn test_tree_separates_classes() {
        let mut tree = DecisionTree::new(TreeConfig::default());
        let dataset = separable_dataset();
        tree.fit(&dataset);

        assert!(tree.predict_proba_one(&[9.0]) > 0.9);
        assert!(tree.predict_proba_one(&[1.0]) < 0.1);
    }

    #[test]
    fn test_unfitted_tree_is_neutral() {
        let tree = DecisionTree::new(TreeConfig::default());
        assert_eq!(tree.predict_proba_one(&[1.0]), 0.5);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let mut dataset = Dataset::new(vec!["signal".to_string(), "noise".to_string()]);
        for i in 0..100 {
            let signal = i as f64;
            let label = if signal > 50.0 { 1.0 } else { 0.0 };
            dataset.add_sample(vec![signal, 0.0], label);
        }

        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&dataset);

        let total: f64 = tree.feature_importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        // All of the information is in the first column
        assert!(tree.feature_importances()[0] > 0.99);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut tree = DecisionTree::new(TreeConfig::default());
        let dataset = separable_dataset();
        tree.fit(&dataset);

        let json = serde_json::to_string(&tree).unwrap();
        let reloaded: DecisionTree = serde_json::from_str(&json).unwrap();

        for x in [0.5, 2.5, 5.5, 9.5] {
            assert_eq!(
                tree.predict_proba_one(&[x]).to_bits(),
                reloaded.predict_proba_one(&[x]).to_bits()
            );
        }
    }
}
