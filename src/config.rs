//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::dataset::CANONICAL_FEATURES;
use crate::error::{Result, ScreeningError};
use crate::inference::InferenceConfig;
use crate::training::GradientBoostingConfig;

const RISK_THRESHOLD_ENV: &str = "SCREENING_RISK_THRESHOLD";

/// Configuration for the screening service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Directory holding the paired model and encoder artifacts
    pub model_dir: PathBuf,
    /// Model artifact file name inside `model_dir`
    pub model_file: String,
    /// Encoder artifact file name inside `model_dir`
    pub encoder_file: String,
    /// Reference dataset used when no persisted model is usable
    pub dataset_path: PathBuf,
    /// Accepted target column names, tried in order
    pub target_aliases: Vec<String>,
    /// Minimum number of canonical feature columns required to train
    pub min_feature_columns: usize,
    /// Held-out fraction for evaluation
    pub validation_split: f64,
    /// Seed for splitting and synthetic data
    pub random_seed: u64,
    /// Gradient boosting hyperparameters
    pub boosting: GradientBoostingConfig,
    /// Rows of synthetic data used for the default model
    pub default_model_rows: usize,
    /// Inference settings
    pub inference: InferenceConfig,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        let mut inference = InferenceConfig::default();
        if let Some(threshold) = risk_threshold_override() {
            inference.risk_threshold = threshold;
        }

        Self {
            model_dir: std::env::var("SCREENING_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./models")),
            model_file: "autism_screening_model.bin".to_string(),
            encoder_file: "autism_encoders.bin".to_string(),
            dataset_path: std::env::var("SCREENING_DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    PathBuf::from("./datas/Autism_screening/Autism_Screening_Data_Combined.csv")
                }),
            target_aliases: vec!["Class/ASD Traits".to_string(), "Class/ASD".to_string()],
            min_feature_columns: 10,
            validation_split: 0.2,
            random_seed: 42,
            boosting: GradientBoostingConfig::default(),
            default_model_rows: 100,
            inference,
        }
    }
}

/// `SCREENING_RISK_THRESHOLD`, if set and parsable
fn risk_threshold_override() -> Option<f64> {
    let raw = std::env::var(RISK_THRESHOLD_ENV).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(threshold) => Some(threshold),
        Err(e) => {
            warn!(value = %raw, error = %e, "Ignoring unparsable {}", RISK_THRESHOLD_ENV);
            None
        }
    }
}

impl ScreeningConfig {
    /// Create a configuration with defaults and environment overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the model directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Builder method to set the dataset path
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    /// Builder method to set the accepted target aliases
    pub fn with_target_aliases(mut self, aliases: Vec<String>) -> Self {
        self.target_aliases = aliases;
        self
    }

    /// Builder method to set boosting hyperparameters
    pub fn with_boosting(mut self, boosting: GradientBoostingConfig) -> Self {
        self.boosting = boosting;
        self
    }

    /// Builder method to set inference settings
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self.boosting.random_state = Some(seed);
        self
    }

    /// Full path of the model artifact
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    /// Full path of the encoder artifact
    pub fn encoder_path(&self) -> PathBuf {
        self.model_dir.join(&self.encoder_file)
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.target_aliases.iter().all(|a| a.trim().is_empty()) {
            return Err(ScreeningError::ConfigError(
                "at least one target column alias is required".to_string(),
            ));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(ScreeningError::ConfigError(format!(
                "validation_split must be in (0, 1), got {}",
                self.validation_split
            )));
        }
        if self.min_feature_columns == 0 || self.min_feature_columns > CANONICAL_FEATURES.len() {
            return Err(ScreeningError::ConfigError(format!(
                "min_feature_columns must be in 1..={}, got {}",
                CANONICAL_FEATURES.len(),
                self.min_feature_columns
            )));
        }
        if self.default_model_rows == 0 {
            return Err(ScreeningError::ConfigError(
                "default_model_rows must be positive".to_string(),
            ));
        }
        self.boosting.validate()?;
        if self.model_file == self.encoder_file {
            return Err(ScreeningError::ConfigError(
                "model and encoder artifacts must use different files".to_string(),
            ));
        }
        self.inference.validate()
    }
}
