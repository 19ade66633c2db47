//! Request/response façade over the classifier and the rule table.
//!
//! The transport (see `main.rs`) hands each decoded [`Request`] to
//! [`ClassifierService::handle`] and writes back the [`Response`]. Requests
//! are plain JSON objects tagged by `op`:
//!
//! ```json
//! {"op": "predict", "transaction": {"description": "UBER TRIP", "amount": 23.45}}
//! ```

use crate::config::{AppConfig, StorageConfig};
use crate::error::{ClassifierError, Result};
use crate::metrics::{ServiceMetrics, ServingStats};
use crate::models::classifier::TransactionClassifier;
use crate::rules::RuleEngine;
use crate::training_data::{bundled_dataset, catalog_categories};
use crate::types::prediction::{ModelMetrics, Prediction, TrainingSummary};
use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "transaction-classifier";

/// Operations accepted from the upstream router
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Retrain on caller-provided labels
    Train {
        transactions: Vec<TransactionRecord>,
        categories: Vec<String>,
    },
    /// Model prediction, or the rule table while untrained
    Predict { transaction: TransactionRecord },
    PredictBatch { transactions: Vec<TransactionRecord> },
    /// Rule table only
    Classify {
        #[serde(default)]
        description: String,
        #[serde(default)]
        merchant: Option<String>,
    },
    ClassifyBatch { transactions: Vec<TransactionRecord> },
    Metrics,
    Categories {
        #[serde(default)]
        source: Option<CategorySource>,
    },
    Save {
        #[serde(default)]
        path: Option<String>,
    },
    Load {
        #[serde(default)]
        path: Option<String>,
    },
    Status,
}

/// Which category list to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Labels of the live model generation
    Model,
    /// Rule table categories
    Rules,
    /// Catalog of the bundled dataset
    Catalog,
}

/// Classifier currently answering `predict`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingMode {
    Model,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainResponse {
    pub status: String,
    pub message: String,
    pub summary: TrainingSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    pub predictions: Vec<Prediction>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoriesResponse {
    pub source: CategorySource,
    pub categories: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageResponse {
    pub status: String,
    pub path: String,
    pub generation: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub trained: bool,
    pub mode: ServingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<Uuid>,
    pub stats: ServingStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl ErrorResponse {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: "invalid_request".to_string(),
        }
    }
}

impl From<&ClassifierError> for ErrorResponse {
    fn from(err: &ClassifierError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

/// Reply to one request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Trained(TrainResponse),
    Prediction(Prediction),
    Batch(BatchResponse),
    Metrics(ModelMetrics),
    Categories(CategoriesResponse),
    Stored(StorageResponse),
    Status(StatusResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

/// Classifier, rule table and serving statistics behind one entry point
pub struct ClassifierService {
    classifier: TransactionClassifier,
    rules: RuleEngine,
    metrics: Arc<ServiceMetrics>,
    storage: StorageConfig,
    train_on_startup: bool,
}

impl ClassifierService {
    pub fn new(config: &AppConfig, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            classifier: TransactionClassifier::new(config),
            rules: RuleEngine::new(),
            metrics,
            storage: config.storage.clone(),
            train_on_startup: config.training.train_on_startup,
        }
    }

    pub fn classifier(&self) -> &TransactionClassifier {
        &self.classifier
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    pub fn mode(&self) -> ServingMode {
        if self.classifier.is_trained() {
            ServingMode::Model
        } else {
            ServingMode::Rules
        }
    }

    /// Produce the first model generation.
    ///
    /// Restores `storage.model_path` when `load_on_startup` is set, falling
    /// back to the bundled dataset if that fails and startup training is
    /// enabled. Returns `None` when the service starts untrained.
    pub fn warm_start(&self) -> Result<Option<TrainingSummary>> {
        if self.storage.load_on_startup {
            if let Some(path) = &self.storage.model_path {
                match self.classifier.load_model(path) {
                    Ok(summary) => return Ok(Some(summary)),
                    Err(e) if self.train_on_startup => {
                        warn!(
                            path = %path,
                            error = %e,
                            "Could not restore model, training on bundled data"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if !self.train_on_startup {
            info!("Startup training disabled, serving from rule table");
            return Ok(None);
        }

        let (transactions, labels) = bundled_dataset();
        info!(samples = transactions.len(), "Training on bundled dataset");
        let summary = self.classifier.train(&transactions, &labels)?;
        self.metrics.record_training();
        Ok(Some(summary))
    }

    /// Decode, handle and encode one JSON request line
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!(error = %e, "Malformed request");
                self.metrics.record_error();
                Response::Error(ErrorResponse::invalid_request(format!("malformed request: {}", e)))
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            error!(error = %e, "Failed to encode response");
            r#"{"error":"failed to encode response","kind":"internal"}"#.to_string()
        })
    }

    pub fn handle(&self, request: Request) -> Response {
        let start = Instant::now();
        let response = match request {
            Request::Train {
                transactions,
                categories,
            } => self.train(&transactions, &categories),
            Request::Predict { transaction } => self.predict(&transaction),
            Request::PredictBatch { transactions } => self.predict_batch(&transactions, start),
            Request::Classify {
                description,
                merchant,
            } => {
                let prediction = self.rules.classify(&description, merchant.as_deref());
                self.metrics.record_prediction(&prediction);
                Response::Prediction(prediction)
            }
            Request::ClassifyBatch { transactions } => {
                let predictions = self.rules.classify_batch(&transactions);
                self.batch_response(predictions, start)
            }
            Request::Metrics => Response::Metrics(self.classifier.metrics()),
            Request::Categories { source } => self.categories(source),
            Request::Save { path } => self.save(path),
            Request::Load { path } => self.load(path),
            Request::Status => self.status(),
        };

        if response.is_error() {
            self.metrics.record_error();
        }
        self.metrics.record_latency(start.elapsed());
        response
    }

    fn train(&self, transactions: &[TransactionRecord], labels: &[String]) -> Response {
        match self.classifier.train(transactions, labels) {
            Ok(summary) => {
                self.metrics.record_training();
                Response::Trained(TrainResponse {
                    status: "success".to_string(),
                    message: format!("Model retrained with {} samples", summary.training_samples),
                    summary,
                })
            }
            Err(e) => {
                warn!(error = %e, "Training rejected");
                Response::Error(ErrorResponse::from(&e))
            }
        }
    }

    fn predict(&self, transaction: &TransactionRecord) -> Response {
        let prediction = match self.classifier.predict(transaction) {
            Ok(prediction) => prediction,
            Err(ClassifierError::ModelNotTrained) => self.rules.classify_record(transaction),
            Err(e) => return Response::Error(ErrorResponse::from(&e)),
        };
        self.metrics.record_prediction(&prediction);
        Response::Prediction(prediction)
    }

    fn predict_batch(&self, transactions: &[TransactionRecord], start: Instant) -> Response {
        let predictions = match self.classifier.predict_batch(transactions) {
            Ok(predictions) => predictions,
            Err(ClassifierError::ModelNotTrained) => self.rules.classify_batch(transactions),
            Err(e) => return Response::Error(ErrorResponse::from(&e)),
        };
        self.batch_response(predictions, start)
    }

    fn batch_response(&self, predictions: Vec<Prediction>, start: Instant) -> Response {
        for prediction in &predictions {
            self.metrics.record_prediction(prediction);
        }
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        Response::Batch(BatchResponse {
            predictions,
            processing_time_ms: (elapsed_ms * 100.0).round() / 100.0,
        })
    }

    fn categories(&self, source: Option<CategorySource>) -> Response {
        let source = source.unwrap_or(match self.mode() {
            ServingMode::Model => CategorySource::Model,
            ServingMode::Rules => CategorySource::Rules,
        });
        let categories = match source {
            CategorySource::Model => self.classifier.categories(),
            CategorySource::Rules => self.rules.categories(),
            CategorySource::Catalog => catalog_categories(),
        };

        Response::Categories(CategoriesResponse {
            source,
            count: categories.len(),
            categories,
        })
    }

    fn storage_path(&self, path: Option<String>) -> std::result::Result<String, ErrorResponse> {
        path.or_else(|| self.storage.model_path.clone()).ok_or_else(|| {
            ErrorResponse::invalid_request("no model path given and none configured")
        })
    }

    fn save(&self, path: Option<String>) -> Response {
        let path = match self.storage_path(path) {
            Ok(path) => path,
            Err(e) => return Response::Error(e),
        };

        match self.classifier.save_model(&path) {
            Ok(generation) => Response::Stored(StorageResponse {
                status: "saved".to_string(),
                path,
                generation,
            }),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to save model");
                Response::Error(ErrorResponse::from(&e))
            }
        }
    }

    fn load(&self, path: Option<String>) -> Response {
        let path = match self.storage_path(path) {
            Ok(path) => path,
            Err(e) => return Response::Error(e),
        };

        match self.classifier.load_model(&path) {
            Ok(summary) => Response::Stored(StorageResponse {
                status: "loaded".to_string(),
                path,
                generation: summary.generation,
            }),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to load model");
                Response::Error(ErrorResponse::from(&e))
            }
        }
    }

    fn status(&self) -> Response {
        Response::Status(StatusResponse {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained: self.classifier.is_trained(),
            mode: self.mode(),
            generation: self.classifier.registry().snapshot().map(|m| m.generation),
            stats: self.metrics.snapshot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::PredictionSource;

    fn untrained_service() -> ClassifierService {
        let mut config = AppConfig::default();
        config.training.train_on_startup = false;
        ClassifierService::new(&config, Arc::new(ServiceMetrics::new()))
    }

    fn trained_service() -> ClassifierService {
        let metrics = Arc::new(ServiceMetrics::new());
        let service = ClassifierService::new(&AppConfig::default(), metrics);
        service.warm_start().unwrap();
        service
    }

    #[test]
    fn test_request_decoding() {
        let request: Request = serde_json::from_str(
            r#"{"op":"predict","transaction":
                {"description":"UBER TRIP","amount":23.45,"merchant":"Uber"}}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            Request::Predict {
                transaction: TransactionRecord::new("UBER TRIP", 23.45).with_merchant("Uber")
            }
        );

        let request: Request = serde_json::from_str(r#"{"op":"categories"}"#).unwrap();
        assert_eq!(request, Request::Categories { source: None });
    }

    #[test]
    fn test_untrained_predict_uses_rules() {
        let service = untrained_service();
        assert!(service.warm_start().unwrap().is_none());

        let response = service.handle(Request::Predict {
            transaction: TransactionRecord::new("STARBUCKS COFFEE #1234", 5.75)
                .with_merchant("Starbucks"),
        });

        match response {
            Response::Prediction(prediction) => {
                assert_eq!(prediction.source, PredictionSource::Rules);
                assert_eq!(prediction.category, "Dining");
                assert_eq!(prediction.confidence, 0.88);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(service.metrics().snapshot().rule_predictions, 1);
    }

    #[test]
    fn test_untrained_metrics_sentinel() {
        let service = untrained_service();
        assert_eq!(
            service.handle(Request::Metrics),
            Response::Metrics(ModelMetrics::default())
        );
    }

    #[test]
    fn test_trained_predict_uses_model() {
        let service = trained_service();
        assert_eq!(service.mode(), ServingMode::Model);

        let response = service.handle(Request::Predict {
            transaction: TransactionRecord::new("WALMART GROCERY #1234", 87.42),
        });

        match response {
            Response::Prediction(prediction) => {
                assert_eq!(prediction.source, PredictionSource::Model);
                assert_eq!(prediction.category, "Groceries");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_batch_reports_processing_time() {
        let service = trained_service();
        let transactions = vec![
            TransactionRecord::new("UBER TRIP", 23.45),
            TransactionRecord::new("NETFLIX SUBSCRIPTION", 15.99),
        ];

        match service.handle(Request::PredictBatch { transactions }) {
            Response::Batch(batch) => {
                assert_eq!(batch.predictions.len(), 2);
                assert!(batch.processing_time_ms >= 0.0);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(service.metrics().snapshot().predictions_served, 2);
    }

    #[test]
    fn test_train_errors_map_to_kinds() {
        let service = untrained_service();
        let response = service.handle(Request::Train {
            transactions: vec![TransactionRecord::new("UBER TRIP", 23.45)],
            categories: vec!["Transportation".into(), "Travel".into()],
        });

        assert_eq!(
            response,
            Response::Error(ErrorResponse {
                error: "number of transactions (1) must match number of labels (2)".into(),
                kind: "input_mismatch".into(),
            })
        );
        assert_eq!(service.mode(), ServingMode::Rules);
        assert_eq!(service.metrics().snapshot().errors, 1);
    }

    #[test]
    fn test_categories_by_source() {
        let service = untrained_service();

        match service.handle(Request::Categories { source: None }) {
            Response::Categories(c) => {
                assert_eq!(c.source, CategorySource::Rules);
                assert_eq!(c.count, 10);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        match service.handle(Request::Categories {
            source: Some(CategorySource::Catalog),
        }) {
            Response::Categories(c) => assert_eq!(c.count, 16),
            other => panic!("unexpected response: {:?}", other),
        }
        match service.handle(Request::Categories {
            source: Some(CategorySource::Model),
        }) {
            Response::Categories(c) => assert!(c.categories.is_empty()),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_save_without_path_or_model() {
        let service = untrained_service();

        match service.handle(Request::Save { path: None }) {
            Response::Error(e) => assert_eq!(e.kind, "invalid_request"),
            other => panic!("unexpected response: {:?}", other),
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin").to_string_lossy().into_owned();
        match service.handle(Request::Save { path: Some(path) }) {
            Response::Error(e) => assert_eq!(e.kind, "model_not_trained"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_save_then_load_via_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin").to_string_lossy().into_owned();
        let trained = trained_service();
        let generation = trained.classifier().registry().snapshot().unwrap().generation;

        match trained.handle(Request::Save { path: Some(path.clone()) }) {
            Response::Stored(stored) => assert_eq!(stored.generation, generation),
            other => panic!("unexpected response: {:?}", other),
        }

        let fresh = untrained_service();
        match fresh.handle(Request::Load { path: Some(path) }) {
            Response::Stored(stored) => assert_eq!(stored.generation, generation),
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(fresh.mode(), ServingMode::Model);
    }

    #[test]
    fn test_handle_line() {
        let service = untrained_service();

        let reply = service.handle_line(r#"{"op":"classify","description":"","merchant":""}"#);
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["category"], "Other");
        assert_eq!(value["confidence"], 0.5);
        assert_eq!(value["source"], "rules");

        let reply = service.handle_line("not json");
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["kind"], "invalid_request");

        let reply = service.handle_line(r#"{"op":"status"}"#);
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["service"], SERVICE_NAME);
        assert_eq!(value["trained"], false);
        assert_eq!(value["mode"], "rules");
    }
}
