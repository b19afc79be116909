//! Classification metrics for the held-out test partition

use crate::data::Dataset;
use crate::models::forest::RandomForest;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision/recall/F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// 0 = legitimate, 1 = fraud
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of this class in the test partition
    pub support: usize,
}

/// 2x2 confusion matrix at the decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

/// Metrics reported by the evaluate stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub per_class: Vec<ClassMetrics>,
    pub confusion: ConfusionMatrix,
    pub roc_auc: f64,
    pub test_samples: usize,
}

impl EvaluationReport {
    /// Compute the report from true labels and predicted fraud
    /// probabilities, thresholding for the hard-decision metrics.
    pub fn compute(y_true: &Array1<f64>, y_prob: &Array1<f64>, threshold: f64) -> Self {
        assert_eq!(y_true.len(), y_prob.len(), "labels and scores must align");

        let mut confusion = ConfusionMatrix {
            true_negative: 0,
            false_positive: 0,
            false_negative: 0,
            true_positive: 0,
        };

        for (&label, &probability) in y_true.iter().zip(y_prob.iter()) {
            let actual_fraud = label > 0.5;
            let predicted_fraud = probability >= threshold;
            match (actual_fraud, predicted_fraud) {
                (false, false) => confusion.true_negative += 1,
                (false, true) => confusion.false_positive += 1,
                (true, false) => confusion.false_negative += 1,
                (true, true) => confusion.true_positive += 1,
            }
        }

        let legitimate = class_metrics(
            0,
            confusion.true_negative,
            confusion.false_negative,
            confusion.false_positive,
        );
        let fraud = class_metrics(
            1,
            confusion.true_positive,
            confusion.false_positive,
            confusion.false_negative,
        );

        Self {
            per_class: vec![legitimate, fraud],
            confusion,
            roc_auc: roc_auc_score(y_true, y_prob),
            test_samples: y_true.len(),
        }
    }
}

/// Score a fitted model on the test partition.
pub fn evaluate_model(model: &RandomForest, test: &Dataset, threshold: f64) -> EvaluationReport {
    let probabilities = Array1::from_vec(model.predict_proba(test));
    EvaluationReport::compute(&test.labels_array(), &probabilities, threshold)
}

fn class_metrics(class: u8, tp: usize, fp: usize, fn_: usize) -> ClassMetrics {
    let precision = if tp + fp == 0 {
        0.0
    } else {
        tp as f64 / (tp + fp) as f64
    };
    let recall = if tp + fn_ == 0 {
        0.0
    } else {
        tp as f64 / (tp + fn_) as f64
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassMetrics {
        class,
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

/// Area under the ROC curve via the rank statistic, with tied scores
/// assigned their average rank. Degenerate single-class inputs score a
/// neutral 0.5.
pub fn roc_auc_score(y_true: &Array1<f64>, y_score: &Array1<f64>) -> f64 {
    assert_eq!(y_true.len(), y_score.len(), "labels and scores must align");

    let n = y_true.len();
    let n_positive = y_true.iter().filter(|&&label| label > 0.5).count();
    let n_negative = n - n_positive;
    if n_positive == 0 || n_negative == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over runs of tied scores
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &index in &order[i..=j] {
            ranks[index] = average_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&label, _)| label > 0.5)
        .map(|(_, &rank)| rank)
        .sum();

    let n_positive = n_positive as f64;
    let n_negative = n_negative as f64;
    (positive_rank_sum - n_positive * (n_positive + 1.0) / 2.0) / (n_positive * n_negative)
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for metrics in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                metrics.class, metrics.precision, metrics.recall, metrics.f1, metrics.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows: actual, cols: predicted):")?;
        writeln!(
            f,
            "  [[{:>8} {:>8}]",
            self.confusion.true_negative, self.confusion.false_positive
        )?;
        writeln!(
            f,
            "   [{:>8} {:>8}]]",
            self.confusion.false_negative, self.confusion.true_positive
        )?;
        writeln!(f)?;
        write!(f, "ROC AUC Score: {:.4}", self.roc_auc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_precision_recall_on_known_vectors() {
        // Actual:    1 1 1 0 0
        // Predicted: 1 1 0 1 0  =>  TP=2, FP=1, FN=1, TN=1
        let y_true = array![1.0, 1.0, 1.0, 0.0, 0.0];
        let y_prob = array![0.9, 0.8, 0.2, 0.7, 0.1];

        let report = EvaluationReport::compute(&y_true, &y_prob, 0.5);

        assert_eq!(report.confusion.true_positive, 2);
        assert_eq!(report.confusion.false_positive, 1);
        assert_eq!(report.confusion.false_negative, 1);
        assert_eq!(report.confusion.true_negative, 1);

        let fraud = &report.per_class[1];
        assert_eq!(fraud.class, 1);
        assert!((fraud.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((fraud.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((fraud.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(fraud.support, 3);

        let legitimate = &report.per_class[0];
        assert_eq!(legitimate.support, 2);
        assert!((legitimate.precision - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_perfect_and_reversed() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];

        let ascending = array![0.1, 0.2, 0.8, 0.9];
        assert!((roc_auc_score(&y_true, &ascending) - 1.0).abs() < 1e-12);

        let reversed = array![0.9, 0.8, 0.2, 0.1];
        assert!(roc_auc_score(&y_true, &reversed).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_strictly_interior_with_one_inversion() {
        // One negative outranks one positive: 7 of 8 pairs correct
        let y_true = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        let y_prob = array![0.1, 0.2, 0.3, 0.85, 0.8, 0.9];

        let auc = roc_auc_score(&y_true, &y_prob);
        assert!(auc > 0.0 && auc < 1.0);
        assert!((auc - 7.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_ties_and_degenerate_inputs() {
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let tied = array![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc_score(&y_true, &tied) - 0.5).abs() < 1e-12);

        let all_negative = array![0.0, 0.0];
        let scores = array![0.3, 0.6];
        assert!((roc_auc_score(&all_negative, &scores) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_report_display_sections() {
        let y_true = array![1.0, 0.0, 1.0, 0.0];
        let y_prob = array![0.9, 0.1, 0.8, 0.6];

        let rendered = EvaluationReport::compute(&y_true, &y_prob, 0.5).to_string();
        assert!(rendered.contains("precision"));
        assert!(rendered.contains("Confusion matrix"));
        assert!(rendered.contains("ROC AUC Score:"));
    }
}
