//! Reference dataset ingestion and validation
//!
//! The training data contract is a CSV with whitespace-tolerant headers, one
//! of the configured target columns, and the fourteen canonical feature
//! columns. Column names are matched case-insensitively after trimming and
//! re-emitted in their canonical spelling. Class labels collapse to
//! [`POSITIVE_LABEL`] / [`NEGATIVE_LABEL`] regardless of casing, and rows
//! with a null in any selected column are dropped.

mod loader;

pub use loader::DatasetLoader;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreeningError};

/// Number of binary questionnaire answers
pub const QUESTION_COUNT: usize = 10;

/// The ten questionnaire columns
pub const QUESTION_COLUMNS: [&str; QUESTION_COUNT] =
    ["A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10"];

/// Age column name
pub const AGE_COLUMN: &str = "Age_Mons";
/// Sex column name
pub const SEX_COLUMN: &str = "Sex";
/// Jaundice history column name
pub const JAUNDICE_COLUMN: &str = "Jaundice";
/// Family history column name
pub const FAMILY_HISTORY_COLUMN: &str = "Family_mem_with_ASD";

/// All fourteen canonical feature columns in schema order
pub const CANONICAL_FEATURES: [&str; 14] = [
    "A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10",
    AGE_COLUMN, SEX_COLUMN, JAUNDICE_COLUMN, FAMILY_HISTORY_COLUMN,
];

/// Canonical positive class label
pub const POSITIVE_LABEL: &str = "Yes";
/// Canonical negative class label
pub const NEGATIVE_LABEL: &str = "No";

/// Key used to match a header against a canonical name.
pub(crate) fn column_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Collapse yes/no labels to their canonical spelling.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("yes") {
        POSITIVE_LABEL.to_string()
    } else if trimmed.eq_ignore_ascii_case("no") {
        NEGATIVE_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Column names a model is trained against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Resolved target column (canonical alias spelling)
    pub target_column: String,
    /// Usable feature columns in canonical order
    pub feature_columns: Vec<String>,
}

impl DatasetSchema {
    /// Number of feature columns
    pub fn width(&self) -> usize {
        self.feature_columns.len()
    }
}

/// A validated dataset ready for training
#[derive(Debug, Clone)]
pub struct ScreeningDataset {
    /// Normalized frame: feature columns followed by the target column
    pub frame: DataFrame,
    /// Target and feature columns
    pub schema: DatasetSchema,
    /// Rows present in the file
    pub rows_read: usize,
}

impl ScreeningDataset {
    /// Rows kept after dropping incomplete ones
    pub fn rows_kept(&self) -> usize {
        self.frame.height()
    }

    /// Rows dropped for missing values
    pub fn rows_dropped(&self) -> usize {
        self.rows_read.saturating_sub(self.rows_kept())
    }

    /// Count of rows per class label
    pub fn class_counts(&self) -> Result<Vec<(String, usize)>> {
        let values = ColumnValues::read(&self.frame, &self.schema.target_column)?;
        let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
        for label in values.as_labels().into_iter().flatten() {
            *counts.entry(label).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

/// Values of a single column, split by storage kind
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    /// Read a column: string columns stay text, everything else is cast to f64.
    pub(crate) fn read(df: &DataFrame, name: &str) -> Result<Self> {
        let column = df
            .column(name)
            .map_err(|_| ScreeningError::DataError(format!("column not found: {}", name)))?;

        if column.dtype() == &DataType::String {
            let values = column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| {
                    v.map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .collect();
            Ok(ColumnValues::Text(values))
        } else {
            let cast = column.cast(&DataType::Float64)?;
            let values = cast.f64()?.into_iter().collect();
            Ok(ColumnValues::Numeric(values))
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub(crate) fn is_present(&self, row: usize) -> bool {
        match self {
            ColumnValues::Numeric(v) => v[row].map_or(false, |x| x.is_finite()),
            ColumnValues::Text(v) => v[row].is_some(),
        }
    }

    /// Render every value as a label string.
    pub(crate) fn as_labels(&self) -> Vec<Option<String>> {
        match self {
            ColumnValues::Text(v) => v.clone(),
            ColumnValues::Numeric(v) => v.iter().map(|x| x.map(format_number)).collect(),
        }
    }

    /// Keep only the given rows, producing a polars column.
    pub(crate) fn select_rows(&self, name: &str, rows: &[usize]) -> Column {
        let series = match self {
            ColumnValues::Numeric(v) => {
                let kept: Vec<f64> = rows.iter().filter_map(|&r| v[r]).collect();
                Series::new(name.into(), kept)
            }
            ColumnValues::Text(v) => {
                let kept: Vec<String> = rows.iter().filter_map(|&r| v[r].clone()).collect();
                Series::new(name.into(), kept)
            }
        };
        series.into()
    }
}

/// Integral floats print without a fractional part.
pub(crate) fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}
