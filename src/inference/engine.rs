//! Inference engine implementation
//!
//! Holds one immutable model + encoder pair behind `Arc`s. Every call only
//! reads shared state, so `predict` may run from any number of threads at
//! once.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::behavioral;
use super::result::{BehavioralAnalysis, FeatureImportance, RiskLevel, ScreeningResult};
use super::InferenceConfig;
use crate::dataset::QUESTION_COUNT;
use crate::error::{Result, ScreeningError};
use crate::preprocessing::{EncoderSet, FeatureCodec, RawStudentInput};
use crate::training::{argmax, ScreeningModel};

/// Screening inference over a fitted model
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    model: Arc<ScreeningModel>,
    codec: FeatureCodec,
    config: InferenceConfig,
    degraded: bool,
}

impl InferenceEngine {
    /// Pair a model with the encoders it was trained with
    pub fn new(model: ScreeningModel, encoders: EncoderSet, config: InferenceConfig) -> Result<Self> {
        if model.n_features() != encoders.width() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", encoders.width()),
                actual: format!("{} features", model.n_features()),
            });
        }
        config.validate()?;

        let codec = FeatureCodec::new(Arc::new(encoders), config.policy);
        Ok(Self {
            model: Arc::new(model),
            codec,
            config,
            degraded: false,
        })
    }

    /// Assemble without validation; callers guarantee the widths agree
    pub(crate) fn from_parts(model: ScreeningModel, encoders: EncoderSet, config: InferenceConfig) -> Self {
        let codec = FeatureCodec::new(Arc::new(encoders), config.policy);
        Self {
            model: Arc::new(model),
            codec,
            config,
            degraded: false,
        }
    }

    /// Mark this engine as serving the synthetic default model
    pub fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn model(&self) -> &ScreeningModel {
        &self.model
    }

    pub fn encoders(&self) -> &EncoderSet {
        self.codec.encoders()
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Feature columns the model consumes, in order
    pub fn schema(&self) -> &[String] {
        self.codec.encoders().schema()
    }

    /// Screen one request
    pub fn predict(&self, raw: &RawStudentInput) -> Result<ScreeningResult> {
        let features = self.codec.encode(raw)?;
        let proba = self.model.predict_proba(&features.to_row()?)?;
        let distribution = proba.row(0).to_vec();

        let class = argmax(&distribution);
        let confidence = distribution[class];
        let label = self.codec.decode_label(class);
        let positive = self.codec.is_positive(class);

        let positive_index = (0..distribution.len())
            .find(|&i| self.codec.is_positive(i))
            .unwrap_or(1);
        let probability_positive = distribution
            .get(positive_index)
            .copied()
            .unwrap_or(0.0);

        let risk = RiskLevel::from_prediction(positive, confidence, self.config.risk_threshold);

        debug!(
            label = %label,
            confidence,
            risk = %risk,
            degraded = self.degraded,
            "Screening prediction"
        );

        Ok(ScreeningResult {
            risk,
            traits_detected: positive,
            confidence,
            probability_positive,
            features_analyzed: features.len(),
            feature_importance: self.rank_importances(raw),
            recommendation: risk.recommendation().to_string(),
        })
    }

    /// Screen a loosely-typed mapping, filling documented defaults
    pub fn analyze_behavioral_features(&self, data: &Map<String, Value>) -> Result<BehavioralAnalysis> {
        let raw = behavioral::assemble_input(data)?;
        let result = self.predict(&raw)?;
        Ok(behavioral::shape(result, &raw, self.degraded))
    }

    /// Pair the questionnaire columns with the model's importances, highest
    /// first. Models without importances yield an empty list.
    fn rank_importances(&self, raw: &RawStudentInput) -> Vec<FeatureImportance> {
        let importances = match self.model.feature_importances() {
            Some(imp) => imp,
            None => return Vec::new(),
        };

        let mut ranked: Vec<FeatureImportance> = self
            .schema()
            .iter()
            .take(QUESTION_COUNT)
            .zip(importances.iter())
            .map(|(column, &importance)| FeatureImportance {
                feature: column.clone(),
                importance,
                value: raw.value_json(column),
            })
            .collect();

        // stable: equal scores keep schema order
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.config.top_importances);
        ranked
    }
}
