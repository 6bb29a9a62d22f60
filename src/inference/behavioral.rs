//! Convenience adapter for loosely-typed screening requests

use serde_json::{Map, Value};

use super::result::{AgeBand, BehavioralAnalysis, ScreeningResult, ScreeningSummary, RESOURCES};
use crate::error::Result;
use crate::preprocessing::RawStudentInput;

pub const DEFAULT_AGE_MONTHS: u32 = 24;
pub const DEFAULT_SEX: &str = "Male";
pub const DEFAULT_JAUNDICE: &str = "no";
pub const DEFAULT_FAMILY_HISTORY: &str = "no";

/// Build a request from a mapping, filling absent demographics with defaults.
///
/// Answers may also be nested under `q_chat_answers`; top-level keys win.
pub fn assemble_input(data: &Map<String, Value>) -> Result<RawStudentInput> {
    let mut map = Map::new();
    if let Some(Value::Object(answers)) = data.get("q_chat_answers") {
        map.extend(answers.clone());
    }
    for (key, value) in data {
        if key != "q_chat_answers" {
            map.insert(key.clone(), value.clone());
        }
    }

    let defaults = [
        ("age_months", Value::from(DEFAULT_AGE_MONTHS)),
        ("sex", Value::from(DEFAULT_SEX)),
        ("jaundice", Value::from(DEFAULT_JAUNDICE)),
        ("family_asd", Value::from(DEFAULT_FAMILY_HISTORY)),
    ];
    for (key, default) in defaults {
        match map.get(key) {
            Some(v) if !v.is_null() => {}
            _ => {
                map.insert(key.to_string(), default);
            }
        }
    }

    RawStudentInput::try_from(map)
}

/// Sum of the ten answers, missing ones counted as 0
pub fn behavioral_score(raw: &RawStudentInput) -> u32 {
    raw.answers_or_zero().iter().map(|&a| u32::from(a)).sum()
}

pub(crate) fn shape(result: ScreeningResult, raw: &RawStudentInput, degraded: bool) -> BehavioralAnalysis {
    let score = behavioral_score(raw);
    BehavioralAnalysis {
        behavioral_score: score,
        age_appropriate_analysis: AgeBand::from_months(raw.age_months).advisory().to_string(),
        screening_summary: ScreeningSummary {
            risk_level: result.risk,
            confidence: result.confidence,
            traits_detected: result.traits_detected,
            behavioral_score: score,
        },
        next_steps: result.risk.next_steps(),
        resources: RESOURCES.to_vec(),
        degraded,
        result,
    }
}
