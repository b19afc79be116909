//! Model training, persistence and inference

pub mod forest;
pub mod inference;
pub mod store;
pub mod tree;

pub use forest::{ForestConfig, RandomForest};
pub use inference::InferenceEngine;
pub use store::ArtifactStore;
pub use tree::{DecisionTree, TreeConfig};
