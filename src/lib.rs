//! asd-screen - Questionnaire-based developmental screening
//!
//! This crate owns the model lifecycle behind a screening service:
//! - Validation of the reference CSV dataset
//! - Gradient-boosted training with stratified evaluation
//! - Paired, checksummed persistence of the model and its encoders
//! - Load-or-train bootstrap with a degraded default-model fallback
//! - Thread-safe inference bucketing predictions into risk levels
//!
//! # Modules
//!
//! ## Data
//! - [`dataset`] - CSV ingestion, header normalization, schema resolution
//! - [`preprocessing`] - Category encoders and the request codec
//!
//! ## Model
//! - [`training`] - Gradient boosting, logistic fallback, metrics
//! - [`export`] - Paired model + encoder artifacts
//! - [`inference`] - Risk bucketing and importance ranking
//!
//! ## Service
//! - [`bootstrap`] - Load-or-train lifecycle and readiness gate
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Data
pub mod dataset;
pub mod preprocessing;

// Model
pub mod training;
pub mod export;
pub mod inference;

// Service
pub mod bootstrap;
pub mod cli;

pub use error::{Result, ScreeningError};

/// Prelude for common imports
pub mod prelude {
    pub use crate::bootstrap::{BootstrapOutcome, BootstrapState, ScreeningService};
    pub use crate::config::ScreeningConfig;
    pub use crate::dataset::{DatasetLoader, DatasetSchema, ScreeningDataset};
    pub use crate::error::{Result, ScreeningError};
    pub use crate::export::ModelStore;
    pub use crate::inference::{
        BehavioralAnalysis, InferenceConfig, InferenceEngine, RiskLevel, ScreeningResult,
    };
    pub use crate::preprocessing::{EncoderSet, EncodingPolicy, RawStudentInput};
    pub use crate::training::{
        GradientBoostingConfig, ScreeningModel, Trainer, TrainingMetrics, TrainingOutput,
    };
}
