//! Typed inference outcome: fraud probability plus thresholded verdict

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default decision threshold applied to the fraud probability.
///
/// A design constant, not derived from the ROC curve; callers who need a
/// different operating point can override it via `detection.threshold` in
/// the pipeline configuration.
pub const DEFAULT_FRAUD_THRESHOLD: f64 = 0.5;

/// Thresholded binary decision for a scored transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Fraud,
    NotFraud,
}

impl Verdict {
    /// Classify a fraud probability against a threshold.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Verdict::Fraud
        } else {
            Verdict::NotFraud
        }
    }

    /// The single-line form written to the verdict artifact.
    pub fn artifact_line(&self) -> &'static str {
        match self {
            Verdict::Fraud => "Fraud Detected",
            Verdict::NotFraud => "No Fraud Detected",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_line())
    }
}

/// Result of scoring a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Estimated probability that the transaction is fraudulent, in [0, 1]
    pub probability: f64,
    /// Decision at the configured threshold
    pub verdict: Verdict,
}

impl Prediction {
    pub fn new(probability: f64, threshold: f64) -> Self {
        Self {
            probability,
            verdict: Verdict::from_probability(probability, threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_probability() {
        assert_eq!(
            Verdict::from_probability(0.9, DEFAULT_FRAUD_THRESHOLD),
            Verdict::Fraud
        );
        assert_eq!(
            Verdict::from_probability(0.1, DEFAULT_FRAUD_THRESHOLD),
            Verdict::NotFraud
        );
        // Threshold is inclusive on the fraud side
        assert_eq!(
            Verdict::from_probability(0.5, DEFAULT_FRAUD_THRESHOLD),
            Verdict::Fraud
        );
    }

    #[test]
    fn test_artifact_lines() {
        assert_eq!(Verdict::Fraud.artifact_line(), "Fraud Detected");
        assert_eq!(Verdict::NotFraud.artifact_line(), "No Fraud Detected");
    }

    #[test]
    fn test_prediction_serialization() {
        let prediction = Prediction::new(0.73, DEFAULT_FRAUD_THRESHOLD);

        let json = serde_json::to_string(&prediction).unwrap();
        let deserialized: Prediction = serde_json::from_str(&json).unwrap();

        assert_eq!(prediction, deserialized);
        assert_eq!(deserialized.verdict, Verdict::Fraud);
    }
}
