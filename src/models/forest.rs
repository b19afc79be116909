//! Random forest classifier over bootstrapped decision trees

use crate::data::Dataset;
use crate::models::tree::{DecisionTree, TreeConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split; sqrt of the total when None
    pub max_features: Option<usize>,
    /// Bootstrap-sample each tree's training rows
    pub bootstrap: bool,
    /// Base seed; each tree derives its own stream from (seed, index)
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Fitted random forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_names: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Fit the ensemble.
    ///
    /// Trees are built across rayon workers for throughput only: every
    /// tree seeds its RNG streams from (seed, tree index), so the fitted
    /// model is identical regardless of the parallelism degree.
    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_names = dataset.feature_names.clone();
        let n_features = dataset.n_features();

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .min(n_features);

        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_config = TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed: self.config.seed.wrapping_add(i as u64),
                };

                let mut tree = DecisionTree::new(tree_config);
                if self.config.bootstrap {
                    let sample =
                        bootstrap_sample(dataset, self.config.seed.wrapping_add(i as u64));
                    tree.fit(&sample);
                } else {
                    tree.fit(dataset);
                }
                tree
            })
            .collect();

        self.trees = trees;

        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (i, &importance) in tree.feature_importances().iter().enumerate() {
                self.feature_importances[i] += importance;
            }
        }
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for importance in &mut self.feature_importances {
                *importance /= sum;
            }
        }
    }

    /// Fraud probability for one feature vector: mean of the per-tree
    /// leaf probabilities.
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_proba_one(features))
            .sum();
        sum / self.trees.len() as f64
    }

    /// Fraud probabilities for a whole dataset.
    pub fn predict_proba(&self, dataset: &Dataset) -> Vec<f64> {
        dataset
            .features
            .par_iter()
            .map(|features| self.predict_proba_one(features))
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Column order the model was fitted on; inference input must be
    /// assembled in this order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// (name, importance) pairs sorted most important first.
    pub fn feature_importance_ranking(&self) -> Vec<(&str, f64)> {
        let mut ranking: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .zip(self.feature_importances.iter())
            .map(|(name, &importance)| (name.as_str(), importance))
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranking
    }
}

/// Sample n rows with replacement, seeded per tree.
fn bootstrap_sample(dataset: &Dataset, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = dataset.n_samples();
    let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    dataset.subset(&indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset() -> Dataset {
        let mut dataset = Dataset::new(vec!["x".to_string(), "y".to_string()]);
        for i in 0..120 {
            let x = i as f64 / 12.0;
            let y = (i % 7) as f64;
            let label = if x > 5.0 { 1.0 } else { 0.0 };
            dataset.add_sample(vec![x, y], label);
        }
        dataset
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 15,
            max_depth: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_forest_separates_classes() {
        let mut forest = RandomForest::new(small_config());
        forest.fit(&separable_dataset());

        assert_eq!(forest.n_trees(), 15);
        assert!(forest.predict_proba_one(&[9.0, 1.0]) > 0.8);
        assert!(forest.predict_proba_one(&[1.0, 1.0]) < 0.2);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let dataset = separable_dataset();

        let mut first = RandomForest::new(small_config());
        first.fit(&dataset);
        let mut second = RandomForest::new(small_config());
        second.fit(&dataset);

        // Same seed, same model, regardless of worker scheduling
        for row in &dataset.features {
            assert_eq!(
                first.predict_proba_one(row).to_bits(),
                second.predict_proba_one(row).to_bits()
            );
        }
    }

    #[test]
    fn test_repeated_prediction_is_stable() {
        let mut forest = RandomForest::new(small_config());
        forest.fit(&separable_dataset());

        let features = [4.2, 3.0];
        let first = forest.predict_proba_one(&features);
        let second = forest.predict_proba_one(&features);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let mut forest = RandomForest::new(small_config());
        let dataset = separable_dataset();
        forest.fit(&dataset);

        for probability in forest.predict_proba(&dataset) {
            assert!((0.0..=1.0).contains(&probability));
        }
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut forest = RandomForest::new(ForestConfig {
            n_trees: 5,
            max_depth: 4,
            ..Default::default()
        });
        let dataset = separable_dataset();
        forest.fit(&dataset);

        let json = serde_json::to_string(&forest).unwrap();
        let reloaded: RandomForest = serde_json::from_str(&json).unwrap();

        assert_eq!(reloaded.n_trees(), forest.n_trees());
        assert_eq!(reloaded.feature_names(), forest.feature_names());
        for row in dataset.features.iter().take(10) {
            assert_eq!(
                forest.predict_proba_one(row).to_bits(),
                reloaded.predict_proba_one(row).to_bits()
            );
        }
    }

    #[test]
    fn test_importance_ranking_finds_the_signal() {
        let mut forest = RandomForest::new(small_config());
        forest.fit(&separable_dataset());

        let ranking = forest.feature_importance_ranking();
        assert_eq!(ranking[0].0, "x");
        assert!(ranking[0].1 > ranking[1].1);
    }
}
