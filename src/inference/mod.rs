//! Inference module
//!
//! Turns a screening request into a risk bucket:
//! - Encodes the request against the model's training schema
//! - Buckets the prediction into low / moderate / high
//! - Ranks questionnaire feature importances
//! - Shapes results for the behavioral convenience wrapper

mod config;
mod engine;
mod result;
pub mod behavioral;

pub use config::InferenceConfig;
pub use engine::InferenceEngine;
pub use result::{
    AgeBand, BehavioralAnalysis, FeatureImportance, Resource, RiskLevel, ScreeningResult,
    ScreeningSummary, RESOURCES,
};
