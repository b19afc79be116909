//! Persistence of fitted artifacts: scaler, model, split manifest, verdict

use crate::config::PipelineConfig;
use crate::data::SplitManifest;
use crate::error::{PipelineError, Result};
use crate::models::forest::RandomForest;
use crate::scaler::StandardScaler;
use crate::types::Verdict;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads and writes the pipeline's durable artifacts at configured paths.
///
/// Writers overwrite any prior snapshot at the same path; callers needing
/// versioning manage distinct paths themselves. Loaders are read-only and
/// fail with the matching not-found error when a prerequisite stage has
/// not run.
pub struct ArtifactStore {
    scaler_path: PathBuf,
    model_path: PathBuf,
    split_path: PathBuf,
    verdict_path: PathBuf,
}

impl ArtifactStore {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            scaler_path: config.paths.scaler.clone(),
            model_path: config.paths.model.clone(),
            split_path: config.paths.split_manifest.clone(),
            verdict_path: config.paths.verdict.clone(),
        }
    }

    pub fn save_scaler(&self, scaler: &StandardScaler) -> Result<()> {
        write_json(&self.scaler_path, scaler)?;
        info!(path = %self.scaler_path.display(), "scaler persisted");
        Ok(())
    }

    pub fn load_scaler(&self) -> Result<StandardScaler> {
        if !self.scaler_path.exists() {
            return Err(PipelineError::ScalerNotFound {
                path: self.scaler_path.clone(),
            });
        }
        read_json(&self.scaler_path)
    }

    pub fn save_model(&self, model: &RandomForest) -> Result<()> {
        write_json(&self.model_path, model)?;
        info!(
            path = %self.model_path.display(),
            trees = model.n_trees(),
            "model persisted"
        );
        Ok(())
    }

    pub fn load_model(&self) -> Result<RandomForest> {
        if !self.model_path.exists() {
            return Err(PipelineError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }
        read_json(&self.model_path)
    }

    pub fn save_split(&self, manifest: &SplitManifest) -> Result<()> {
        write_json(&self.split_path, manifest)?;
        info!(path = %self.split_path.display(), "split manifest persisted");
        Ok(())
    }

    /// Load the persisted split, or None when no manifest has been written.
    pub fn load_split(&self) -> Result<Option<SplitManifest>> {
        if !self.split_path.exists() {
            return Ok(None);
        }
        read_json(&self.split_path).map(Some)
    }

    /// Write the single-line verdict artifact.
    pub fn write_verdict(&self, verdict: Verdict) -> Result<()> {
        ensure_parent(&self.verdict_path)?;
        let mut file = File::create(&self.verdict_path)?;
        writeln!(file, "{}", verdict.artifact_line())?;
        info!(path = %self.verdict_path.display(), %verdict, "verdict written");
        Ok(())
    }

    pub fn verdict_path(&self) -> &Path {
        &self.verdict_path
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, value)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
