//! Inference engine: scores a single transaction with persisted artifacts

use crate::error::Result;
use crate::models::forest::RandomForest;
use crate::models::store::ArtifactStore;
use crate::scaler::StandardScaler;
use crate::types::{Prediction, TransactionRecord};
use tracing::debug;

/// Scores transactions against a fitted model and scaler.
///
/// Both artifacts are consumed read-only; the engine never refits the
/// scaler, so a record is transformed exactly as the training corpus was.
pub struct InferenceEngine {
    scaler: StandardScaler,
    model: RandomForest,
    threshold: f64,
}

impl InferenceEngine {
    pub fn new(scaler: StandardScaler, model: RandomForest, threshold: f64) -> Self {
        Self {
            scaler,
            model,
            threshold,
        }
    }

    /// Load the persisted scaler and model from the store.
    ///
    /// Fails with `ScalerNotFound` / `ModelNotFound` when the preprocess
    /// or train stage has not produced its artifact yet.
    pub fn from_store(store: &ArtifactStore, threshold: f64) -> Result<Self> {
        let scaler = store.load_scaler()?;
        let model = store.load_model()?;
        Ok(Self::new(scaler, model, threshold))
    }

    /// Decision threshold applied to the fraud probability.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one transaction.
    ///
    /// Validates that every feature the model was trained on is present
    /// before any computation, applies the scaler to the raw-scale
    /// features, and thresholds the ensemble's class-1 probability.
    /// Deterministic: repeated calls with the same record return the same
    /// probability.
    pub fn predict(&self, record: &TransactionRecord) -> Result<Prediction> {
        for name in self.model.feature_names() {
            record.require(name)?;
        }

        let scaled = self.scaler.transform_record(record)?;
        let features = scaled.to_vector(self.model.feature_names())?;
        let probability = self.model.predict_proba_one(&features);

        let prediction = Prediction::new(probability, self.threshold);
        debug!(
            probability = prediction.probability,
            verdict = %prediction.verdict,
            "transaction scored"
        );
        Ok(prediction)
    }
}
