//! Request-to-feature-vector encoding and class-label decoding

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use super::EncoderSet;
use crate::dataset::{
    format_number, AGE_COLUMN, FAMILY_HISTORY_COLUMN, JAUNDICE_COLUMN, NEGATIVE_LABEL,
    POSITIVE_LABEL, QUESTION_COLUMNS, QUESTION_COUNT, SEX_COLUMN,
};
use crate::error::{Result, ScreeningError};

/// How the codec treats missing answers and unseen categories.
///
/// `Lenient` keeps inference available for partial questionnaires and novel
/// categorical values by substituting code 0, at the cost of a possible
/// misclassification for truly novel categories. `Strict` rejects both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    #[default]
    Lenient,
    Strict,
}

/// One screening request as supplied by the caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct RawStudentInput {
    /// Questionnaire answers A1..A10; `None` when not supplied
    pub answers: [Option<u8>; QUESTION_COUNT],
    /// Age in months
    pub age_months: u32,
    /// "Male" / "Female" or the dataset's own codes
    pub sex: String,
    /// Jaundice history ("yes" / "no")
    pub jaundice: String,
    /// Family history of the condition ("yes" / "no")
    pub family_history: String,
}

/// A single raw field value before encoding
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Number(f64),
    Text(String),
}

impl RawStudentInput {
    /// Create an input with no answers filled in
    pub fn new(
        age_months: u32,
        sex: impl Into<String>,
        jaundice: impl Into<String>,
        family_history: impl Into<String>,
    ) -> Self {
        Self {
            answers: [None; QUESTION_COUNT],
            age_months,
            sex: sex.into(),
            jaundice: jaundice.into(),
            family_history: family_history.into(),
        }
    }

    /// Set answer `question` (1-based, A1..A10)
    pub fn with_answer(mut self, question: usize, value: u8) -> Self {
        if (1..=QUESTION_COUNT).contains(&question) {
            self.answers[question - 1] = Some(value);
        }
        self
    }

    /// Set all ten answers
    pub fn with_answers(mut self, answers: [u8; QUESTION_COUNT]) -> Self {
        for (slot, value) in self.answers.iter_mut().zip(answers) {
            *slot = Some(value);
        }
        self
    }

    /// Answers with missing ones counted as 0
    pub fn answers_or_zero(&self) -> [u8; QUESTION_COUNT] {
        let mut out = [0u8; QUESTION_COUNT];
        for (o, a) in out.iter_mut().zip(self.answers.iter()) {
            *o = a.unwrap_or(0);
        }
        out
    }

    /// Raw value for a canonical column, rendered for explanation output
    pub fn value_json(&self, column: &str) -> Value {
        match self.raw_value(column) {
            Some(RawValue::Number(x)) if x.fract() == 0.0 => Value::from(x as i64),
            Some(RawValue::Number(x)) => Value::from(x),
            Some(RawValue::Text(s)) => Value::from(s),
            None => Value::from(0),
        }
    }

    fn raw_value(&self, column: &str) -> Option<RawValue> {
        if let Some(i) = QUESTION_COLUMNS.iter().position(|c| *c == column) {
            return self.answers[i].map(|a| RawValue::Number(f64::from(a)));
        }
        match column {
            AGE_COLUMN => Some(RawValue::Number(f64::from(self.age_months))),
            SEX_COLUMN => Some(RawValue::Text(self.sex.clone())),
            JAUNDICE_COLUMN => Some(RawValue::Text(self.jaundice.clone())),
            FAMILY_HISTORY_COLUMN => Some(RawValue::Text(self.family_history.clone())),
            _ => None,
        }
    }

    /// Reject answers outside {0, 1}
    pub fn validate(&self) -> Result<()> {
        for (i, answer) in self.answers.iter().enumerate() {
            if let Some(v) = answer {
                if *v > 1 {
                    return Err(ScreeningError::InvalidInput(format!(
                        "{} must be 0 or 1, got {}",
                        QUESTION_COLUMNS[i], v
                    )));
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<Map<String, Value>> for RawStudentInput {
    type Error = ScreeningError;

    /// Keys: `A1`..`A10`, `age_months`, `sex`, `jaundice`, `family_asd`.
    /// Canonical dataset column names are accepted as fallbacks.
    fn try_from(map: Map<String, Value>) -> Result<Self> {
        let lookup = |primary: &str, fallback: &str| -> Option<&Value> {
            map.get(primary)
                .or_else(|| map.get(fallback))
                .filter(|v| !v.is_null())
        };

        let mut answers = [None; QUESTION_COUNT];
        for (slot, key) in answers.iter_mut().zip(QUESTION_COLUMNS) {
            *slot = match map.get(key) {
                None | Some(Value::Null) => None,
                Some(v) => Some(parse_answer(key, v)?),
            };
        }

        let age_months = match lookup("age_months", AGE_COLUMN) {
            Some(v) => parse_age(v)?,
            None => return Err(ScreeningError::InvalidInput("age_months is required".into())),
        };

        let text = |primary: &str, fallback: &str| -> Result<String> {
            match lookup(primary, fallback) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(Value::Number(n)) => Ok(n.to_string()),
                Some(Value::Bool(b)) => Ok(if *b { "yes" } else { "no" }.to_string()),
                Some(other) => Err(ScreeningError::InvalidInput(format!(
                    "{} must be a string, got {}",
                    primary, other
                ))),
                None => Err(ScreeningError::InvalidInput(format!("{} is required", primary))),
            }
        };

        let input = Self {
            answers,
            age_months,
            sex: text("sex", SEX_COLUMN)?,
            jaundice: text("jaundice", JAUNDICE_COLUMN)?,
            family_history: text("family_asd", FAMILY_HISTORY_COLUMN)?,
        };
        input.validate()?;
        Ok(input)
    }
}

fn parse_answer(key: &str, value: &Value) -> Result<u8> {
    let parsed = match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => n.as_f64().filter(|x| *x == 0.0 || *x == 1.0).map(|x| x as u8),
        Value::String(s) => match s.trim() {
            "0" => Some(0),
            "1" => Some(1),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        ScreeningError::InvalidInput(format!("{} must be 0 or 1, got {}", key, value))
    })
}

fn parse_age(value: &Value) -> Result<u32> {
    let age = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    age.filter(|a| a.is_finite() && *a >= 0.0 && a.fract() == 0.0 && *a <= f64::from(u32::MAX))
        .map(|a| a as u32)
        .ok_or_else(|| {
            ScreeningError::InvalidInput(format!(
                "age_months must be a non-negative integer, got {}",
                value
            ))
        })
}

/// Numeric features in the exact column order of the training schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single-row matrix for the classifier
    pub fn to_row(&self) -> Result<Array2<f64>> {
        Ok(Array2::from_shape_vec((1, self.0.len()), self.0.clone())?)
    }
}

/// Maps raw requests onto the schema captured in an [`EncoderSet`]
#[derive(Debug, Clone)]
pub struct FeatureCodec {
    encoders: Arc<EncoderSet>,
    policy: EncodingPolicy,
}

impl FeatureCodec {
    pub fn new(encoders: Arc<EncoderSet>, policy: EncodingPolicy) -> Self {
        Self { encoders, policy }
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Encode a request into the training-time feature order
    pub fn encode(&self, raw: &RawStudentInput) -> Result<FeatureVector> {
        raw.validate()?;

        let mut values = Vec::with_capacity(self.encoders.width());
        for column in self.encoders.schema() {
            let value = match raw.raw_value(column) {
                Some(v) => v,
                None => self.missing(column)?,
            };

            let encoded = match self.encoders.feature(column) {
                Some(encoder) => {
                    let text = match &value {
                        RawValue::Text(s) => s.trim().to_string(),
                        RawValue::Number(x) => format_number(*x),
                    };
                    match encoder.transform(&text) {
                        Some(code) => code as f64,
                        None => self.unseen(column, &text)?,
                    }
                }
                None => match value {
                    RawValue::Number(x) => x,
                    RawValue::Text(s) => match s.trim().parse::<f64>() {
                        Ok(x) if x.is_finite() => x,
                        _ => self.unseen(column, &s)?,
                    },
                },
            };
            values.push(encoded);
        }

        Ok(FeatureVector(values))
    }

    /// Human-readable label for a class index
    pub fn decode_label(&self, class_index: usize) -> String {
        self.encoders
            .target()
            .and_then(|t| t.inverse_transform(class_index))
            .map(str::to_string)
            .unwrap_or_else(|| {
                if class_index == 1 {
                    POSITIVE_LABEL.to_string()
                } else {
                    NEGATIVE_LABEL.to_string()
                }
            })
    }

    /// Whether a class index decodes to the positive label
    pub fn is_positive(&self, class_index: usize) -> bool {
        self.decode_label(class_index) == POSITIVE_LABEL
    }

    fn missing(&self, column: &str) -> Result<RawValue> {
        match self.policy {
            EncodingPolicy::Lenient => Ok(RawValue::Number(0.0)),
            EncodingPolicy::Strict => Err(ScreeningError::InvalidInput(format!(
                "{} is required",
                column
            ))),
        }
    }

    fn unseen(&self, column: &str, value: &str) -> Result<f64> {
        match self.policy {
            EncodingPolicy::Lenient => {
                warn!(feature = %column, value = %value, "Unknown category, using default code 0");
                Ok(0.0)
            }
            EncodingPolicy::Strict => Err(ScreeningError::UnknownCategory {
                feature: column.to_string(),
                value: value.to_string(),
            }),
        }
    }
}
