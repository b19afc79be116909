//! Labeled transaction table: feature matrix, labels, column names

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use std::path::Path;

/// Name of the binary label column in the raw and preprocessed CSVs.
pub const LABEL_COLUMN: &str = "Class";

/// In-memory dataset with features and binary labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature matrix (n_samples x n_features)
    pub features: Vec<Vec<f64>>,
    /// Binary labels: 1.0 fraud, 0.0 legitimate
    pub labels: Vec<f64>,
    /// Feature column names, in file order
    pub feature_names: Vec<String>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            feature_names,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Add a labeled sample.
    pub fn add_sample(&mut self, features: Vec<f64>, label: f64) {
        assert_eq!(features.len(), self.feature_names.len());
        self.features.push(features);
        self.labels.push(label);
    }

    /// Position of a feature column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Select rows by index.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Number of fraud rows.
    pub fn n_positive(&self) -> usize {
        self.labels.iter().filter(|&&l| l > 0.5).count()
    }

    /// Fraction of fraud rows in the dataset.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.n_positive() as f64 / self.labels.len() as f64
    }

    /// Labels as an ndarray.
    pub fn labels_array(&self) -> Array1<f64> {
        Array1::from_vec(self.labels.clone())
    }

    /// Load a labeled CSV, separating the `Class` column from the features.
    ///
    /// Fails with `DatasetNotFound` when the path does not exist, and with
    /// `MalformedDataset` on an absent label column or an unparseable cell;
    /// no value is ever silently defaulted.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::DatasetNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        let label_idx = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| {
                PipelineError::MalformedDataset(format!(
                    "label column '{LABEL_COLUMN}' not present in {}",
                    path.display()
                ))
            })?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut dataset = Dataset::new(feature_names);

        for (row_number, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = Vec::with_capacity(dataset.n_features());
            let mut label = 0.0;

            for (i, cell) in record.iter().enumerate() {
                let value: f64 = cell.trim().parse().map_err(|_| {
                    PipelineError::MalformedDataset(format!(
                        "row {}: cannot parse '{}' in column '{}'",
                        row_number + 1,
                        cell,
                        headers[i]
                    ))
                })?;
                if i == label_idx {
                    label = value;
                } else {
                    row.push(value);
                }
            }

            if row.len() != dataset.n_features() {
                return Err(PipelineError::MalformedDataset(format!(
                    "row {}: expected {} feature values, found {}",
                    row_number + 1,
                    dataset.n_features(),
                    row.len()
                )));
            }

            dataset.add_sample(row, label);
        }

        Ok(dataset)
    }

    /// Write the dataset as CSV with the label column re-attached.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        let mut header = self.feature_names.clone();
        header.push(LABEL_COLUMN.to_string());
        writer.write_record(&header)?;

        for i in 0..self.n_samples() {
            let mut row: Vec<String> = self.features[i].iter().map(|v| v.to_string()).collect();
            row.push(self.labels[i].to_string());
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}
