//! One trained model generation.

use crate::error::Degradation;
use crate::feature_extractor::{Extraction, FeatureExtractor, FeatureVector};
use crate::models::forest::{ForestError, RandomForest};
use crate::types::prediction::{Alternative, ModelMetrics, Prediction, TrainingSummary};
use crate::types::transaction::TransactionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Number of ranked alternatives returned with a prediction
pub const MAX_ALTERNATIVES: usize = 3;

/// A fully-formed model: ensemble, category set, and the feature extractor
/// fitted in the same run.
///
/// Never mutated after construction. Retraining builds a new value and the
/// registry swaps it in whole, so the vocabulary, scaling statistics and
/// trees used together always come from one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub generation: Uuid,
    pub forest: RandomForest,
    /// Sorted distinct training labels; index = ensemble class id
    pub categories: Vec<String>,
    pub extractor: FeatureExtractor,
    pub accuracy: f64,
    pub training_samples: usize,
    pub trained_at: DateTime<Utc>,
    pub feature_count: usize,
}

impl TrainedModel {
    /// Predict one transaction.
    ///
    /// Never fails: an inference error produces the documented default
    /// flagged with [`Degradation::Prediction`].
    pub fn predict(&self, record: &TransactionRecord) -> Prediction {
        let Extraction {
            vector,
            degradation,
        } = self.extractor.extract(record);

        match self.infer(&vector) {
            Ok(prediction) => {
                debug!(
                    generation = %self.generation,
                    category = %prediction.category,
                    confidence = prediction.confidence,
                    "Prediction complete"
                );
                prediction.with_degradation(degradation)
            }
            Err(e) => {
                warn!(
                    generation = %self.generation,
                    error = %e,
                    "Inference failed, substituting default category"
                );
                Prediction::fallback(&self.categories, Degradation::prediction(e.to_string()))
            }
        }
    }

    fn infer(&self, vector: &FeatureVector) -> Result<Prediction, ForestError> {
        if vector.len() != self.feature_count {
            return Err(ForestError::DimensionMismatch {
                expected: self.feature_count,
                found: vector.len(),
            });
        }

        let tally = self.forest.votes(vector.as_slice())?;
        let majority = tally.majority();

        let alternatives = tally
            .ranked(MAX_ALTERNATIVES)
            .into_iter()
            .map(|(class, score)| Ok(Alternative::new(self.category(class)?, score)))
            .collect::<Result<Vec<_>, ForestError>>()?;

        Ok(Prediction::from_model(
            self.category(majority)?.to_string(),
            tally.fraction(majority),
            alternatives,
        ))
    }

    fn category(&self, class: usize) -> Result<&str, ForestError> {
        self.categories
            .get(class)
            .map(String::as_str)
            .ok_or(ForestError::UnknownClass {
                label: class,
                n_classes: self.categories.len(),
            })
    }

    /// Metrics as reported to callers, accuracy rounded to 4 places.
    pub fn metrics(&self) -> ModelMetrics {
        ModelMetrics {
            accuracy: (self.accuracy * 10_000.0).round() / 10_000.0,
            training_samples: self.training_samples,
            categories: self.categories.clone(),
            last_trained: Some(self.trained_at),
            feature_count: self.feature_count,
        }
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            generation: self.generation,
            training_samples: self.training_samples,
            category_count: self.categories.len(),
            accuracy: self.accuracy,
            feature_count: self.feature_count,
            trained_at: self.trained_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::models::forest::ForestParams;
    use crate::models::tree::DecisionTree;

    fn model(n_estimators: usize) -> TrainedModel {
        let records = vec![
            TransactionRecord::new("UBER TRIP", 23.45),
            TransactionRecord::new("UBER RIDE", 18.90),
            TransactionRecord::new("LYFT RIDE", 21.00),
            TransactionRecord::new("NETFLIX SUBSCRIPTION", 15.99),
            TransactionRecord::new("NETFLIX MONTHLY", 15.99),
            TransactionRecord::new("HULU SUBSCRIPTION", 12.99),
        ];
        let labels = vec![1, 1, 1, 0, 0, 0];
        let (extractor, vectors) = FeatureExtractor::fit(&records, &FeatureConfig::default());
        let params = ForestParams {
            n_estimators,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&vectors, &labels, 2, &params).unwrap();

        TrainedModel {
            generation: Uuid::new_v4(),
            forest,
            categories: vec!["Entertainment".into(), "Transportation".into()],
            feature_count: extractor.feature_count(),
            extractor,
            accuracy: 0.833_333_33,
            training_samples: records.len(),
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn test_predict_ranks_alternatives() {
        let model = model(15);
        let prediction = model.predict(&TransactionRecord::new("NETFLIX SUBSCRIPTION", 15.99));

        assert_eq!(prediction.category, "Entertainment");
        assert_eq!(prediction.alternatives.len(), 2);
        assert_eq!(prediction.alternatives[0].category, "Entertainment");
        let total: f64 = prediction.alternatives.iter().map(|a| a.confidence).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_width_mismatch_falls_back() {
        let mut model = model(5);
        model.feature_count += 1;

        let prediction = model.predict(&TransactionRecord::new("UBER TRIP", 23.45));

        assert!(prediction.is_fallback());
        assert_eq!(prediction.category, "Entertainment");
        assert_eq!(prediction.confidence, 0.0);
    }

    #[test]
    fn test_malformed_tree_falls_back() {
        let mut model = model(5);
        let width = model.feature_count;
        model.forest = RandomForest::from_trees(vec![DecisionTree::cyclic()], 2, width);

        let prediction = model.predict(&TransactionRecord::new("UBER TRIP", 23.45));

        assert!(prediction.is_fallback());
        assert_eq!(prediction.category, "Entertainment");
        assert_eq!(prediction.confidence, 0.0);
    }

    #[test]
    fn test_empty_category_set_falls_back_to_other() {
        let mut model = model(0);
        model.categories.clear();

        let prediction = model.predict(&TransactionRecord::new("UBER TRIP", 23.45));

        assert!(prediction.is_fallback());
        assert_eq!(prediction.category, "Other");
    }

    #[test]
    fn test_metrics_round_accuracy() {
        let model = model(3);
        let metrics = model.metrics();

        assert_eq!(metrics.accuracy, 0.8333);
        assert_eq!(metrics.training_samples, 6);
        assert_eq!(metrics.last_trained, Some(model.trained_at));
        assert_eq!(model.summary().category_count, 2);
    }
}
