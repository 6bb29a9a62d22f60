//! Categorical label encoding

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::QUESTION_COLUMNS;
use crate::error::{Result, ScreeningError};

/// Stable string-to-index encoder; classes are kept in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit on the distinct values of a column
    pub fn fit<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .collect();

        if classes.is_empty() {
            return Err(ScreeningError::DataError(
                "cannot fit an encoder on an empty column".to_string(),
            ));
        }

        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    /// Index of a category, if it was seen during fitting
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value.trim()))
            .ok()
    }

    /// Category for an index
    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Fitted categories in index order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of categories
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// Encoders and feature schema paired one-to-one with a trained model.
///
/// Built once by the trainer (or the default-model path) and never mutated
/// afterward; persisted together with the model it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderSet {
    schema: Vec<String>,
    features: BTreeMap<String, CategoryEncoder>,
    target: Option<CategoryEncoder>,
}

impl EncoderSet {
    /// Assemble an encoder set; every categorical encoder must name a schema column
    pub fn new(
        schema: Vec<String>,
        features: BTreeMap<String, CategoryEncoder>,
        target: Option<CategoryEncoder>,
    ) -> Result<Self> {
        if schema.is_empty() {
            return Err(ScreeningError::InvalidInput(
                "feature schema must not be empty".to_string(),
            ));
        }
        if let Some(stray) = features.keys().find(|k| !schema.contains(k)) {
            return Err(ScreeningError::InvalidInput(format!(
                "encoder for {} has no column in the schema",
                stray
            )));
        }
        Ok(Self {
            schema,
            features,
            target,
        })
    }

    /// Encoder set for the questionnaire-only default model
    pub fn questionnaire_only() -> Self {
        Self {
            schema: QUESTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
            features: BTreeMap::new(),
            target: None,
        }
    }

    /// Ordered feature columns used at training time
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Number of features a model trained with this set expects
    pub fn width(&self) -> usize {
        self.schema.len()
    }

    /// Encoder for a categorical feature column
    pub fn feature(&self, column: &str) -> Option<&CategoryEncoder> {
        self.features.get(column)
    }

    /// Names of categorical columns
    pub fn categorical_columns(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Target label encoder
    pub fn target(&self) -> Option<&CategoryEncoder> {
        self.target.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_sorts_classes() {
        let enc = CategoryEncoder::fit(["m", "f", "m", " f "]).unwrap();
        assert_eq!(enc.classes(), &["f".to_string(), "m".to_string()]);
        assert_eq!(enc.transform("f"), Some(0));
        assert_eq!(enc.transform(" m"), Some(1));
        assert_eq!(enc.transform("Male"), None);
        assert_eq!(enc.inverse_transform(1), Some("m"));
        assert_eq!(enc.inverse_transform(2), None);
    }

    #[test]
    fn test_target_labels_map_no_before_yes() {
        let enc = CategoryEncoder::fit(["Yes", "No", "Yes"]).unwrap();
        assert_eq!(enc.transform("No"), Some(0));
        assert_eq!(enc.transform("Yes"), Some(1));
    }

    #[test]
    fn test_empty_fit_rejected() {
        let empty: Vec<String> = Vec::new();
        assert!(CategoryEncoder::fit(empty).is_err());
    }

    #[test]
    fn test_encoder_set_rejects_stray_encoder() {
        let mut features = BTreeMap::new();
        features.insert("Sex".to_string(), CategoryEncoder::fit(["m", "f"]).unwrap());
        let err = EncoderSet::new(vec!["A1".to_string()], features, None);
        assert!(err.is_err());
    }

    #[test]
    fn test_questionnaire_only() {
        let set = EncoderSet::questionnaire_only();
        assert_eq!(set.width(), 10);
        assert!(set.target().is_none());
        assert_eq!(set.categorical_columns().count(), 0);
    }
}
