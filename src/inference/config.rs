//! Inference configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreeningError};
use crate::preprocessing::EncodingPolicy;

/// Configuration for screening inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Confidence at or above which a positive prediction is "high" risk
    pub risk_threshold: f64,

    /// Number of ranked feature importances returned
    pub top_importances: usize,

    /// Treatment of missing answers and unseen categories
    pub policy: EncodingPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            risk_threshold: 0.7,
            top_importances: 5,
            policy: EncodingPolicy::Lenient,
        }
    }
}

impl InferenceConfig {
    pub fn with_risk_threshold(mut self, threshold: f64) -> Self {
        self.risk_threshold = threshold;
        self
    }

    pub fn with_policy(mut self, policy: EncodingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(ScreeningError::ConfigError(format!(
                "risk_threshold must be in [0, 1], got {}",
                self.risk_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.risk_threshold, 0.7);
        assert_eq!(config.top_importances, 5);
        assert_eq!(config.policy, EncodingPolicy::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(InferenceConfig::default().with_risk_threshold(1.5).validate().is_err());
        assert!(InferenceConfig::default().with_risk_threshold(f64::NAN).validate().is_err());
    }
}
