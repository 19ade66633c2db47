//! Random-forest classification engine

pub mod aggregator;
pub mod classifier;
pub mod forest;
pub mod persistence;
pub mod registry;
pub mod snapshot;
pub mod tree;
pub mod validation;

pub use aggregator::VoteTally;
pub use classifier::TransactionClassifier;
pub use forest::{ForestError, ForestParams, RandomForest};
pub use registry::ModelRegistry;
pub use snapshot::TrainedModel;
