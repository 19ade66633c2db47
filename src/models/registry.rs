//! Holder of the live model generation

use crate::error::{ClassifierError, Result};
use crate::models::snapshot::TrainedModel;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Single live [`TrainedModel`], replaced only as a whole.
///
/// Readers clone the `Arc` and release the lock immediately, so inference
/// runs against a snapshot that a concurrent publish cannot change. The last
/// completed publish wins; callers that train concurrently must serialize
/// themselves if they need a specific winner.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelRegistry {
    /// Create an empty registry (untrained)
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation, if any.
    pub fn snapshot(&self) -> Option<Arc<TrainedModel>> {
        // the slot only ever holds a complete value, so a poisoned lock is still consistent
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current generation, or `ModelNotTrained`.
    pub fn require(&self) -> Result<Arc<TrainedModel>> {
        self.snapshot().ok_or(ClassifierError::ModelNotTrained)
    }

    /// Replace the live generation.
    pub fn publish(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let model = Arc::new(model);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&model));

        info!(
            generation = %model.generation,
            replaced = ?previous.as_ref().map(|p| p.generation),
            categories = model.categories.len(),
            "Model generation published"
        );
        model
    }

    pub fn is_trained(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
