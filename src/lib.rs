//! Transaction Classifier Library
//!
//! Assigns spending categories to bank transactions. A random-forest
//! ensemble over TF-IDF text features and a scaled amount serves
//! predictions once trained; a keyword rule table answers until then.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod rules;
pub mod service;
pub mod text;
pub mod training_data;
pub mod types;

pub use config::AppConfig;
pub use error::{ClassifierError, Degradation};
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use models::{ModelRegistry, TrainedModel, TransactionClassifier};
pub use rules::RuleEngine;
pub use service::{ClassifierService, Request, Response};
pub use types::{Prediction, TransactionRecord};
