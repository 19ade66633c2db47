//! Configuration management for the transaction classifier

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable that overrides the configuration file path
pub const CONFIG_PATH_ENV: &str = "CLASSIFIER_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub storage: StorageConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Ensemble hyper-parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum samples in each child of a split
    pub min_samples_leaf: usize,
    /// Seed of the master RNG (bootstrap draws and feature order)
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Text vectorizer settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Maximum vocabulary size
    pub max_terms: usize,
    /// Longest n-gram emitted (1 = unigrams only)
    pub ngram_max: usize,
    /// Minimum document frequency of a kept term
    pub min_df: usize,
    /// Maximum document frequency of a kept term, as a ratio of the corpus
    pub max_df_ratio: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_terms: 100,
            ngram_max: 2,
            min_df: 1,
            max_df_ratio: 0.95,
        }
    }
}

/// Training policy
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Minimum number of labeled samples accepted by train
    pub min_samples: usize,
    /// Upper bound on cross-validation folds
    pub max_folds: usize,
    /// Below this many samples accuracy is scored in-sample
    pub cv_min_samples: usize,
    /// Train on the bundled dataset when the service starts
    pub train_on_startup: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            max_folds: 5,
            cv_min_samples: 10,
            train_on_startup: true,
        }
    }
}

/// Model persistence settings
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Default path used by save/load requests that omit one
    pub model_path: Option<String>,
    /// Restore `model_path` at startup instead of training
    pub load_on_startup: bool,
}

/// Serving settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Spread batch predictions across the rayon pool
    pub parallel_batch: bool,
    /// Seconds between serving-statistics summaries (0 disables)
    pub report_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            parallel_batch: true,
            report_interval_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `CLASSIFIER_CONFIG` or the default path.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("CLASSIFIER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
