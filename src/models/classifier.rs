//! Trainable transaction classifier

use crate::config::{AppConfig, FeatureConfig, TrainingConfig};
use crate::error::{ClassifierError, Result};
use crate::feature_extractor::{FeatureExtractor, FeatureVector};
use crate::models::forest::{ForestParams, RandomForest};
use crate::models::persistence;
use crate::models::registry::ModelRegistry;
use crate::models::snapshot::TrainedModel;
use crate::models::validation;
use crate::types::prediction::{ModelMetrics, Prediction, TrainingSummary};
use crate::types::transaction::TransactionRecord;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Classifier core: trains ensembles and serves predictions from the live
/// generation held in a [`ModelRegistry`].
///
/// States are untrained (empty registry) and trained. Structural failures
/// never touch the registry; only a completed `train` or `load_model`
/// replaces the live generation.
pub struct TransactionClassifier {
    registry: Arc<ModelRegistry>,
    forest: ForestParams,
    features: FeatureConfig,
    training: TrainingConfig,
    parallel_batch: bool,
}

impl TransactionClassifier {
    /// Create an untrained classifier with its own registry
    pub fn new(config: &AppConfig) -> Self {
        Self::with_registry(config, Arc::new(ModelRegistry::new()))
    }

    /// Create a classifier that serves from a shared registry
    pub fn with_registry(config: &AppConfig, registry: Arc<ModelRegistry>) -> Self {
        info!(
            n_estimators = config.model.n_estimators,
            max_depth = config.model.max_depth,
            max_terms = config.features.max_terms,
            "Transaction classifier initialized"
        );

        Self {
            registry,
            forest: ForestParams::from(&config.model),
            features: config.features.clone(),
            training: config.training.clone(),
            parallel_batch: config.service.parallel_batch,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn is_trained(&self) -> bool {
        self.registry.is_trained()
    }

    /// Build a new model generation without publishing it.
    ///
    /// Vocabulary and scaling are derived from this corpus alone. A caller
    /// that needs to abandon training can drop the result; nothing is visible
    /// until it is published.
    pub fn fit(
        &self,
        transactions: &[TransactionRecord],
        labels: &[String],
    ) -> Result<TrainedModel> {
        if transactions.len() != labels.len() {
            return Err(ClassifierError::InputMismatch {
                transactions: transactions.len(),
                labels: labels.len(),
            });
        }
        let required = self.training.min_samples.max(1);
        if transactions.len() < required {
            return Err(ClassifierError::InsufficientData {
                samples: transactions.len(),
                required,
            });
        }

        info!(samples = transactions.len(), "Training classifier");
        let start = Instant::now();

        let categories: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let class_ids: HashMap<&str, usize> = categories
            .iter()
            .enumerate()
            .map(|(id, category)| (category.as_str(), id))
            .collect();
        let encoded: Vec<usize> = labels
            .iter()
            .filter_map(|label| class_ids.get(label.as_str()).copied())
            .collect();

        let (extractor, vectors) = FeatureExtractor::fit(transactions, &self.features);
        let forest = RandomForest::fit(&vectors, &encoded, categories.len(), &self.forest)
            .map_err(|e| ClassifierError::Training(e.to_string()))?;

        let accuracy = validation::estimate_accuracy(
            &vectors,
            &encoded,
            categories.len(),
            &self.forest,
            &forest,
            &self.training,
        );

        let model = TrainedModel {
            generation: Uuid::new_v4(),
            forest,
            feature_count: extractor.feature_count(),
            extractor,
            accuracy,
            training_samples: transactions.len(),
            trained_at: Utc::now(),
            categories,
        };

        info!(
            generation = %model.generation,
            accuracy = format!("{:.2}%", model.accuracy * 100.0),
            categories = model.categories.len(),
            feature_count = model.feature_count,
            trees = model.forest.tree_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(model)
    }

    /// Fit a new generation and publish it.
    pub fn train(
        &self,
        transactions: &[TransactionRecord],
        labels: &[String],
    ) -> Result<TrainingSummary> {
        let model = self.fit(transactions, labels)?;
        Ok(self.registry.publish(model).summary())
    }

    /// Feature vector of a transaction under the live generation.
    pub fn extract_features(&self, transaction: &TransactionRecord) -> Result<FeatureVector> {
        let model = self.registry.require()?;
        Ok(model.extractor.extract(transaction).vector)
    }

    /// Predict one transaction.
    ///
    /// Only fails when untrained; inference problems yield a degraded
    /// prediction instead.
    pub fn predict(&self, transaction: &TransactionRecord) -> Result<Prediction> {
        let model = self.registry.require()?;
        Ok(model.predict(transaction))
    }

    /// Predict many transactions against one generation, preserving order.
    pub fn predict_batch(&self, transactions: &[TransactionRecord]) -> Result<Vec<Prediction>> {
        let model = self.registry.require()?;

        let predictions: Vec<Prediction> = if self.parallel_batch {
            transactions.par_iter().map(|tx| model.predict(tx)).collect()
        } else {
            transactions.iter().map(|tx| model.predict(tx)).collect()
        };

        debug!(
            generation = %model.generation,
            count = predictions.len(),
            "Batch prediction complete"
        );
        Ok(predictions)
    }

    /// Metrics of the live generation, or the empty sentinel when untrained.
    pub fn metrics(&self) -> ModelMetrics {
        self.registry
            .snapshot()
            .map(|model| model.metrics())
            .unwrap_or_default()
    }

    /// Category set of the live generation (empty when untrained).
    pub fn categories(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .map(|model| model.categories.clone())
            .unwrap_or_default()
    }

    /// Persist the live generation, returning the generation written.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<Uuid> {
        let model = self.registry.require()?;
        persistence::save_model(&model, path)?;
        Ok(model.generation)
    }

    /// Restore a persisted generation and make it live.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<TrainingSummary> {
        let model = persistence::load_model(path)?;
        Ok(self.registry.publish(model).summary())
    }
}
