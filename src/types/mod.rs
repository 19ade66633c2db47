//! Type definitions for the transaction classifier

pub mod prediction;
pub mod transaction;

pub use prediction::{Alternative, ModelMetrics, Prediction, PredictionSource, TrainingSummary};
pub use transaction::TransactionRecord;
