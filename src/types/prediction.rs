//! Prediction, metrics and training summary structures

use crate::error::Degradation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned when nothing else applies
pub const DEFAULT_CATEGORY: &str = "Other";

/// Which classifier produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    /// The trained ensemble
    Model,
    /// The keyword rule table
    Rules,
}

/// A ranked alternative category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub category: String,
    pub confidence: f64,
}

impl Alternative {
    pub fn new(category: impl Into<String>, confidence: f64) -> Self {
        Self {
            category: category.into(),
            confidence,
        }
    }
}

/// Category prediction for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted category
    pub category: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Up to three categories by descending score, the prediction first
    pub alternatives: Vec<Alternative>,

    /// Classifier that answered
    pub source: PredictionSource,

    /// Set when the response was produced under an anomaly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<Degradation>,
}

impl Prediction {
    /// Prediction produced by the trained ensemble
    pub fn from_model(category: String, confidence: f64, alternatives: Vec<Alternative>) -> Self {
        Self {
            category,
            confidence,
            alternatives,
            source: PredictionSource::Model,
            degraded: None,
        }
    }

    /// Prediction produced by the rule table
    pub fn from_rules(category: &str, confidence: f64) -> Self {
        Self {
            category: category.to_string(),
            confidence,
            alternatives: vec![Alternative::new(category, confidence)],
            source: PredictionSource::Rules,
            degraded: None,
        }
    }

    /// Documented default substituted for a failed inference.
    ///
    /// The category is the first of the trained set, or "Other" when the set
    /// is empty.
    pub fn fallback(categories: &[String], degradation: Degradation) -> Self {
        let category = categories
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Self {
            alternatives: vec![Alternative::new(category.clone(), 0.0)],
            category,
            confidence: 0.0,
            source: PredictionSource::Model,
            degraded: Some(degradation),
        }
    }

    /// Record a non-fatal anomaly without replacing one already present
    pub fn with_degradation(mut self, degradation: Option<Degradation>) -> Self {
        if self.degraded.is_none() {
            self.degraded = degradation;
        }
        self
    }

    /// True when any anomaly was recorded
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// True when the response is a substituted default rather than a model answer
    pub fn is_fallback(&self) -> bool {
        self.degraded.as_ref().is_some_and(Degradation::is_fallback)
    }
}

/// Model performance metrics.
///
/// An untrained classifier reports `ModelMetrics::default()`: zero accuracy,
/// no categories and no training timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub training_samples: usize,
    pub categories: Vec<String>,
    pub last_trained: Option<DateTime<Utc>>,
    pub feature_count: usize,
}

impl ModelMetrics {
    /// True for the untrained sentinel
    pub fn is_empty(&self) -> bool {
        self.last_trained.is_none()
    }
}

/// Outcome of a successful training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Identifier of the published model generation
    pub generation: Uuid,
    pub training_samples: usize,
    pub category_count: usize,
    pub accuracy: f64,
    pub feature_count: usize,
    pub trained_at: DateTime<Utc>,
}
