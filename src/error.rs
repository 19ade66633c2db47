//! Error taxonomy for the classification engine.
//!
//! Structural failures (wrong input shape, untrained state, too little data,
//! storage problems) are surfaced as [`ClassifierError`] and leave the live
//! model untouched. Numeric or runtime anomalies on the inference path never
//! become errors: they are recorded as a [`Degradation`] on an otherwise
//! well-formed prediction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Structural failures of classifier operations.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The operation needs a trained model and none has been published.
    #[error("model not trained yet")]
    ModelNotTrained,

    /// Transaction and label sequences have different lengths.
    #[error("number of transactions ({transactions}) must match number of labels ({labels})")]
    InputMismatch { transactions: usize, labels: usize },

    /// Fewer samples than the training minimum.
    #[error("at least {required} training samples required, got {samples}")]
    InsufficientData { samples: usize, required: usize },

    /// The ensemble could not be fitted on the prepared features.
    #[error("training failed: {0}")]
    Training(String),

    /// I/O failure while persisting or restoring a model.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl ClassifierError {
    /// Stable machine-readable identifier for responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::ModelNotTrained => "model_not_trained",
            ClassifierError::InputMismatch { .. } => "input_mismatch",
            ClassifierError::InsufficientData { .. } => "insufficient_data",
            ClassifierError::Training(_) => "training_failed",
            ClassifierError::Io(_) => "io",
            ClassifierError::Serialization(_) => "serialization",
        }
    }
}

/// Non-fatal anomaly attached to a successful prediction.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Feature extraction hit an anomaly and zero-filled part of the vector.
    #[error("feature extraction degraded: {reason}")]
    FeatureExtraction { reason: String },

    /// Inference failed and the default category was substituted.
    #[error("prediction degraded: {reason}")]
    Prediction { reason: String },
}

impl Degradation {
    pub fn feature_extraction(reason: impl Into<String>) -> Self {
        Degradation::FeatureExtraction {
            reason: reason.into(),
        }
    }

    pub fn prediction(reason: impl Into<String>) -> Self {
        Degradation::Prediction {
            reason: reason.into(),
        }
    }

    /// True when the whole response is a substituted default.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Degradation::Prediction { .. })
    }
}
