//! Error types for the fraud detection pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by pipeline stages and their components.
///
/// Missing-artifact variants are fatal to the invoking stage and carry the
/// path that was checked; `MissingFeature` is fatal to a single inference
/// call only and leaves persisted state untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dataset not found at {path}; place the labeled transaction CSV there first")]
    DatasetNotFound { path: PathBuf },

    #[error("scaler artifact not found at {path}; run the preprocess stage first")]
    ScalerNotFound { path: PathBuf },

    #[error("model artifact not found at {path}; run the train stage first")]
    ModelNotFound { path: PathBuf },

    #[error("input record is missing required feature '{0}'")]
    MissingFeature(String),

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_feature_message_names_the_feature() {
        let err = PipelineError::MissingFeature("Amount".to_string());
        assert!(err.to_string().contains("Amount"));
    }

    #[test]
    fn test_not_found_messages_carry_the_path() {
        let err = PipelineError::ModelNotFound {
            path: PathBuf::from("artifacts/model.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("artifacts/model.json"));
        assert!(msg.contains("train stage"));
    }
}
