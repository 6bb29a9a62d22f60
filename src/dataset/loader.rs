//! CSV loading and schema validation

use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use super::{
    column_key, normalize_label, ColumnValues, DatasetSchema, ScreeningDataset, CANONICAL_FEATURES,
};
use crate::config::ScreeningConfig;
use crate::error::{Result, ScreeningError};

/// Cell values read as missing, in addition to empty fields
const NULL_LITERALS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn null_values() -> NullValues {
    NullValues::AllColumns(NULL_LITERALS.iter().map(|&s| PlSmallStr::from(s)).collect())
}

/// Loader for the reference screening dataset
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Target column aliases, trimmed, in priority order
    target_aliases: Vec<String>,
    /// Minimum canonical feature columns required
    min_feature_columns: usize,
    /// Rows used for schema inference
    infer_schema_length: usize,
}

impl DatasetLoader {
    /// Create a loader, validating the alias list once up front
    pub fn new(target_aliases: &[String], min_feature_columns: usize) -> Result<Self> {
        let mut aliases: Vec<String> = Vec::with_capacity(target_aliases.len());
        for alias in target_aliases {
            let trimmed = alias.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !aliases.iter().any(|a| column_key(a) == column_key(trimmed)) {
                aliases.push(trimmed.to_string());
            }
        }

        if aliases.is_empty() {
            return Err(ScreeningError::ConfigError(
                "at least one target column alias is required".to_string(),
            ));
        }
        if min_feature_columns == 0 || min_feature_columns > CANONICAL_FEATURES.len() {
            return Err(ScreeningError::ConfigError(format!(
                "min_feature_columns must be in 1..={}",
                CANONICAL_FEATURES.len()
            )));
        }

        Ok(Self {
            target_aliases: aliases,
            min_feature_columns,
            infer_schema_length: 1000,
        })
    }

    /// Create a loader from the service configuration
    pub fn from_config(config: &ScreeningConfig) -> Result<Self> {
        Self::new(&config.target_aliases, config.min_feature_columns)
    }

    /// Accepted target aliases in priority order
    pub fn target_aliases(&self) -> &[String] {
        &self.target_aliases
    }

    /// Read and validate a dataset file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<ScreeningDataset> {
        let raw = self.read_csv(path.as_ref())?;
        self.validate(&raw)
    }

    /// Read a CSV file as-is
    pub fn read_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.is_file() {
            return Err(ScreeningError::DatasetNotFound(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScreeningError::DatasetNotFound(path.to_path_buf()),
            _ => ScreeningError::IoError(e),
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .map_parse_options(|opts| opts.with_null_values(Some(null_values())))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ScreeningError::DataError(e.to_string()))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Read dataset file");
        Ok(df)
    }

    /// Validate a raw frame and normalize it into a training dataset
    pub fn validate(&self, raw: &DataFrame) -> Result<ScreeningDataset> {
        // normalized header -> header as written; first occurrence wins
        let mut headers: HashMap<String, String> = HashMap::new();
        for name in raw.get_column_names() {
            headers.entry(column_key(name.as_str())).or_insert_with(|| name.to_string());
        }

        let (target_column, target_source) = self
            .target_aliases
            .iter()
            .find_map(|alias| {
                headers
                    .get(&column_key(alias))
                    .map(|source| (alias.clone(), source.clone()))
            })
            .ok_or_else(|| ScreeningError::SchemaError {
                aliases: self.target_aliases.clone(),
            })?;

        let features: Vec<(&str, String)> = CANONICAL_FEATURES
            .iter()
            .filter_map(|&canonical| {
                headers
                    .get(&column_key(canonical))
                    .filter(|source| **source != target_source)
                    .map(|source| (canonical, source.clone()))
            })
            .collect();

        if features.len() < self.min_feature_columns {
            return Err(ScreeningError::InsufficientFeatures {
                found: features.len(),
                expected: CANONICAL_FEATURES.len(),
                required: self.min_feature_columns,
            });
        }

        let mut columns: Vec<(String, ColumnValues)> = Vec::with_capacity(features.len() + 1);
        for (canonical, source) in &features {
            columns.push((canonical.to_string(), ColumnValues::read(raw, source)?));
        }

        let labels: Vec<Option<String>> = ColumnValues::read(raw, &target_source)?
            .as_labels()
            .into_iter()
            .map(|label| label.map(|l| normalize_label(&l)).filter(|l| !l.is_empty()))
            .collect();
        columns.push((target_column.clone(), ColumnValues::Text(labels)));

        let rows_read = raw.height();
        let kept: Vec<usize> = (0..rows_read)
            .filter(|&row| columns.iter().all(|(_, values)| values.is_present(row)))
            .collect();

        let frame_columns: Vec<Column> = columns
            .iter()
            .map(|(name, values)| {
                debug_assert_eq!(values.len(), rows_read);
                values.select_rows(name, &kept)
            })
            .collect();
        let frame = DataFrame::new(frame_columns)?;

        let schema = DatasetSchema {
            target_column,
            feature_columns: features.iter().map(|(c, _)| c.to_string()).collect(),
        };

        info!(
            target = %schema.target_column,
            features = schema.width(),
            rows_read,
            rows_kept = kept.len(),
            "Dataset validated"
        );

        Ok(ScreeningDataset {
            frame,
            schema,
            rows_read,
        })
    }
}
