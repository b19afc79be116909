//! Dataset loading, partitioning and rebalancing

pub mod dataset;
pub mod rebalance;
pub mod split;

pub use dataset::{Dataset, LABEL_COLUMN};
pub use rebalance::smote_rebalance;
pub use split::{stratified_split, SplitIndices, SplitManifest};
