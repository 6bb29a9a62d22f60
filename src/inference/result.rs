//! Screening result types

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Three-way risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Bucket a prediction.
    ///
    /// A positive prediction is `High` when `confidence >= threshold` and
    /// `Moderate` below it; a negative prediction is `Low` at any confidence.
    pub fn from_prediction(positive: bool, confidence: f64, threshold: f64) -> Self {
        match (positive, confidence >= threshold) {
            (true, true) => RiskLevel::High,
            (true, false) => RiskLevel::Moderate,
            (false, _) => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "High risk detected. Recommend comprehensive clinical evaluation by specialist."
            }
            RiskLevel::Moderate => {
                "Moderate indicators present. Consider follow-up screening and monitoring."
            }
            RiskLevel::Low => "Low risk indicated. Continue regular developmental monitoring.",
        }
    }

    pub fn next_steps(&self) -> Vec<String> {
        let steps: &[&str] = match self {
            RiskLevel::High => &[
                "Schedule comprehensive clinical evaluation",
                "Refer to developmental specialist",
            ],
            RiskLevel::Moderate => &[
                "Schedule follow-up screening in 3 months",
                "Monitor developmental milestones",
            ],
            RiskLevel::Low => &["Continue regular developmental monitoring"],
        };
        steps.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked feature importance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    #[serde(serialize_with = "round3")]
    pub importance: f64,
    /// Value supplied in the request
    pub value: Value,
}

/// Outcome of a single screening call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    #[serde(rename = "asd_risk")]
    pub risk: RiskLevel,
    #[serde(rename = "asd_traits_detected")]
    pub traits_detected: bool,
    /// Max of the class-probability distribution
    #[serde(serialize_with = "round3")]
    pub confidence: f64,
    /// Probability of the positive class
    #[serde(rename = "probability_asd", serialize_with = "round3")]
    pub probability_positive: f64,
    pub features_analyzed: usize,
    pub feature_importance: Vec<FeatureImportance>,
    pub recommendation: String,
}

/// Developmental age band used for the advisory string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    /// Under 18 months
    Early,
    /// 18 to 35 months
    Critical,
    /// 36 months and older
    Later,
}

impl AgeBand {
    pub fn from_months(age_months: u32) -> Self {
        if age_months < 18 {
            AgeBand::Early
        } else if age_months < 36 {
            AgeBand::Critical
        } else {
            AgeBand::Later
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            AgeBand::Early => "Early screening - monitor developmental milestones closely",
            AgeBand::Critical => "Critical screening period - optimal intervention window",
            AgeBand::Later => "Later screening - comprehensive evaluation recommended",
        }
    }
}

/// Short summary block for the behavioral wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningSummary {
    pub risk_level: RiskLevel,
    #[serde(serialize_with = "round3")]
    pub confidence: f64,
    pub traits_detected: bool,
    pub behavioral_score: u32,
}

/// Support resource listed with every behavioral analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
}

/// Static support resources
pub const RESOURCES: [Resource; 3] = [
    Resource {
        kind: "clinical",
        name: "Developmental Pediatrician Referral",
    },
    Resource {
        kind: "support",
        name: "Early Intervention Programs",
    },
    Resource {
        kind: "educational",
        name: "ASD Parent Support Groups",
    },
];

/// Screening result shaped for the behavioral convenience wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehavioralAnalysis {
    #[serde(flatten)]
    pub result: ScreeningResult,
    /// Sum of the ten binary answers
    pub behavioral_score: u32,
    pub age_appropriate_analysis: String,
    pub screening_summary: ScreeningSummary,
    pub next_steps: Vec<String>,
    pub resources: Vec<Resource>,
    /// Set when the answer came from the synthetic default model
    pub degraded: bool,
}

pub(crate) fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(RiskLevel::from_prediction(true, 0.70, 0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_prediction(true, 0.6999, 0.7), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_prediction(false, 0.99, 0.7), RiskLevel::Low);
        assert_eq!(RiskLevel::from_prediction(false, 0.51, 0.7), RiskLevel::Low);
    }

    #[test]
    fn test_age_bands() {
        assert_eq!(AgeBand::from_months(0), AgeBand::Early);
        assert_eq!(AgeBand::from_months(17), AgeBand::Early);
        assert_eq!(AgeBand::from_months(18), AgeBand::Critical);
        assert_eq!(AgeBand::from_months(35), AgeBand::Critical);
        assert_eq!(AgeBand::from_months(36), AgeBand::Later);
    }

    #[test]
    fn test_result_json_shape() {
        let result = ScreeningResult {
            risk: RiskLevel::Moderate,
            traits_detected: true,
            confidence: 0.61234,
            probability_positive: 0.61234,
            features_analyzed: 14,
            feature_importance: vec![FeatureImportance {
                feature: "A3".to_string(),
                importance: 0.12345,
                value: Value::from(1),
            }],
            recommendation: RiskLevel::Moderate.recommendation().to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["asd_risk"], "moderate");
        assert_eq!(json["asd_traits_detected"], true);
        assert_eq!(json["confidence"], 0.612);
        assert_eq!(json["probability_asd"], 0.612);
        assert_eq!(json["features_analyzed"], 14);
        assert_eq!(json["feature_importance"][0]["importance"], 0.123);
        assert_eq!(json["feature_importance"][0]["value"], 1);
    }

    #[test]
    fn test_next_steps_per_bucket() {
        assert_eq!(RiskLevel::High.next_steps().len(), 2);
        assert_eq!(RiskLevel::Moderate.next_steps().len(), 2);
        assert_eq!(RiskLevel::Low.next_steps(), vec!["Continue regular developmental monitoring"]);
    }
}
