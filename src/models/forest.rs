//! Bootstrap-aggregated ensemble of decision trees.

use crate::config::ModelConfig;
use crate::feature_extractor::FeatureVector;
use crate::models::aggregator::VoteTally;
use crate::models::tree::{DecisionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures inside the ensemble
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("cannot fit an ensemble on an empty training set")]
    EmptyTrainingSet,

    #[error("training set has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("label {label} is outside the {n_classes} known classes")]
    UnknownClass { label: usize, n_classes: usize },

    #[error("ensemble has no trees")]
    NoTrees,

    #[error("tree {tree} has no reachable leaf")]
    MalformedTree { tree: usize },
}

/// Ensemble hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl From<&ModelConfig> for ForestParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            seed: config.seed,
        }
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&ModelConfig::default())
    }
}

/// Random forest classifier.
///
/// Every tree sees a bootstrap sample of the rows and a random feature order
/// at each node. Per-tree seeds are drawn up front from the master seed, so
/// the fitted forest does not depend on how rayon schedules the work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(
        rows: &[FeatureVector],
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self, ForestError> {
        if rows.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ForestError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let n_features = rows[0].len();
        if let Some(row) = rows.iter().find(|r| r.len() != n_features) {
            return Err(ForestError::DimensionMismatch {
                expected: n_features,
                found: row.len(),
            });
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(ForestError::UnknownClass { label, n_classes });
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
        };

        let mut master = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.gen()).collect();
        let n_rows = rows.len();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(rows, labels, n_classes, sample, &tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_classes,
            n_features,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_trees(
        trees: Vec<DecisionTree>,
        n_classes: usize,
        n_features: usize,
    ) -> Self {
        Self {
            trees,
            n_classes,
            n_features,
        }
    }

    /// Collect one vote per tree.
    pub fn votes(&self, features: &[f64]) -> Result<VoteTally, ForestError> {
        if features.len() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(ForestError::NoTrees);
        }

        let mut tally = VoteTally::new(self.n_classes);
        for (index, tree) in self.trees.iter().enumerate() {
            let class = tree
                .predict(features)
                .ok_or(ForestError::MalformedTree { tree: index })?;
            tally.record(class);
        }
        Ok(tally)
    }

    /// Majority-vote class.
    pub fn predict(&self, features: &[f64]) -> Result<usize, ForestError> {
        Ok(self.votes(features)?.majority())
    }

    /// Fraction of rows whose majority vote equals the label.
    pub fn score(&self, rows: &[FeatureVector], labels: &[usize]) -> Result<f64, ForestError> {
        if rows.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ForestError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let mut correct = 0;
        for (row, &label) in rows.iter().zip(labels) {
            if self.predict(row.as_slice())? == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / rows.len() as f64)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
