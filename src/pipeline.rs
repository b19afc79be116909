//! Pipeline orchestrator: Preprocess → Train → Evaluate → Infer
//!
//! Stages run in strict sequence as in-process calls; the first failing
//! stage aborts the run with its own diagnostic attached, later stages
//! never execute, and no verdict artifact is written. A pipeline run owns
//! its artifact paths; concurrent runs against the same paths are a caller
//! responsibility (use distinct working directories or external locking).

use crate::config::PipelineConfig;
use crate::data::{smote_rebalance, stratified_split, Dataset, SplitIndices, SplitManifest};
use crate::evaluation::{evaluate_model, EvaluationReport};
use crate::models::forest::{ForestConfig, RandomForest};
use crate::models::inference::InferenceEngine;
use crate::models::store::ArtifactStore;
use crate::scaler::StandardScaler;
use crate::types::{Prediction, TransactionRecord, Verdict};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Outcome of a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub evaluation: EvaluationReport,
    pub prediction: Prediction,
    pub verdict: Verdict,
}

/// Runs the batch pipeline stages against configured artifact paths.
pub struct Pipeline {
    config: PipelineConfig,
    store: ArtifactStore,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let store = ArtifactStore::from_config(&config);
        Self { config, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Preprocess: load the raw corpus, fit the scaler on the entire
    /// unbalanced dataset, write the scaled corpus and persist the scaler.
    pub fn preprocess(&self) -> Result<()> {
        info!(stage = "preprocess", dataset = %self.config.paths.dataset.display(), "loading data");
        let raw = Dataset::from_csv(&self.config.paths.dataset)?;
        info!(
            rows = raw.n_samples(),
            features = raw.n_features(),
            fraud_rate = raw.positive_rate(),
            "dataset loaded"
        );

        // Fitted before any split or rebalance: downstream consumers must
        // see the statistics of the original distribution.
        let scaler = StandardScaler::fit(&raw)?;
        let scaled = scaler.transform_dataset(&raw)?;

        if let Some(parent) = self.config.paths.preprocessed.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        scaled.to_csv(&self.config.paths.preprocessed)?;
        info!(path = %self.config.paths.preprocessed.display(), "preprocessed corpus written");

        self.store.save_scaler(&scaler)?;
        Ok(())
    }

    /// Train: stratified split, rebalance the training partition only,
    /// fit the forest, persist model and split manifest.
    pub fn train(&self) -> Result<()> {
        info!(stage = "train", "loading preprocessed data");
        let dataset = Dataset::from_csv(&self.config.paths.preprocessed)?;

        let split = &self.config.split;
        let indices = stratified_split(&dataset.labels, split.test_fraction, split.seed);
        let train = dataset.subset(&indices.train);
        info!(
            train_rows = indices.train.len(),
            test_rows = indices.test.len(),
            "dataset partitioned"
        );

        let rebalance = &self.config.rebalance;
        let balanced = smote_rebalance(&train, rebalance.k_neighbors, rebalance.seed);

        let mut model = RandomForest::new(self.forest_config());
        info!(trees = self.config.training.n_trees, "fitting random forest");
        model.fit(&balanced);

        for (name, importance) in model.feature_importance_ranking().iter().take(5) {
            info!(feature = name, importance, "top feature");
        }

        // Quick held-out summary before persisting, on the untouched test
        // partition.
        let test = dataset.subset(&indices.test);
        let summary = evaluate_model(&model, &test, self.config.detection.threshold);
        info!(roc_auc = summary.roc_auc, "held-out performance after fit");

        self.store.save_model(&model)?;
        self.store
            .save_split(&SplitManifest::new(split.seed, split.test_fraction, &indices))?;
        Ok(())
    }

    /// Evaluate: score the persisted model on the held-out partition.
    ///
    /// Prefers the split manifest written at training time; only when it
    /// is absent does it regenerate the partition from the configured
    /// (seed, fraction), which split determinism makes identical for an
    /// unchanged dataset.
    pub fn evaluate(&self) -> Result<EvaluationReport> {
        info!(stage = "evaluate", "loading artifacts");
        let model = self.store.load_model()?;
        let dataset = Dataset::from_csv(&self.config.paths.preprocessed)?;

        let indices = self.held_out_indices(&dataset)?;
        let test = dataset.subset(&indices.test);
        info!(test_rows = test.n_samples(), "scoring held-out partition");

        Ok(evaluate_model(&model, &test, self.config.detection.threshold))
    }

    fn held_out_indices(&self, dataset: &Dataset) -> Result<SplitIndices> {
        match self.store.load_split()? {
            Some(manifest) => {
                manifest.validate(dataset.n_samples())?;
                let split = &self.config.split;
                if manifest.seed != split.seed
                    || (manifest.test_fraction - split.test_fraction).abs() > f64::EPSILON
                {
                    warn!(
                        manifest_seed = manifest.seed,
                        configured_seed = split.seed,
                        "split manifest parameters differ from configuration; \
                         using the persisted indices"
                    );
                }
                Ok(manifest.indices())
            }
            None => {
                warn!("no split manifest found; regenerating the partition from parameters");
                let split = &self.config.split;
                Ok(stratified_split(
                    &dataset.labels,
                    split.test_fraction,
                    split.seed,
                ))
            }
        }
    }

    /// Infer: score one transaction with the persisted scaler and model.
    pub fn infer(&self, record: &TransactionRecord) -> Result<Prediction> {
        info!(stage = "infer", "loading artifacts");
        let engine = InferenceEngine::from_store(&self.store, self.config.detection.threshold)?;
        let prediction = engine.predict(record)?;
        info!(
            probability = prediction.probability,
            verdict = %prediction.verdict,
            "transaction scored"
        );
        Ok(prediction)
    }

    /// Run all stages in order, stopping at the first failure, and write
    /// the verdict artifact on success.
    pub fn run(&self, record: &TransactionRecord) -> Result<PipelineReport> {
        info!("starting pipeline run");

        self.preprocess().context("preprocess stage failed")?;
        self.train().context("train stage failed")?;
        let evaluation = self.evaluate().context("evaluate stage failed")?;
        let prediction = self.infer(record).context("infer stage failed")?;

        self.store.write_verdict(prediction.verdict)?;
        info!(verdict = %prediction.verdict, "pipeline run complete");

        Ok(PipelineReport {
            evaluation,
            prediction,
            verdict: prediction.verdict,
        })
    }

    fn forest_config(&self) -> ForestConfig {
        let training = &self.config.training;
        ForestConfig {
            n_trees: training.n_trees,
            max_depth: training.max_depth,
            min_samples_split: training.min_samples_split,
            min_samples_leaf: training.min_samples_leaf,
            max_features: training.max_features,
            bootstrap: true,
            seed: training.seed,
        }
    }
}
