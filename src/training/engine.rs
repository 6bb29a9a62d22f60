//! Training engine implementation

use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::linear_models::LogisticRegression;
use super::models::{ScreeningModel, TrainingMetrics};
use crate::config::ScreeningConfig;
use crate::dataset::{
    normalize_label, ColumnValues, DatasetSchema, ScreeningDataset, CANONICAL_FEATURES,
    QUESTION_COLUMNS,
};
use crate::error::{Result, ScreeningError};
use crate::preprocessing::{CategoryEncoder, EncoderSet};

/// A fitted model, its paired encoders and held-out metrics
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    pub model: ScreeningModel,
    pub encoders: EncoderSet,
    pub metrics: TrainingMetrics,
}

/// Fits the gradient-boosted screening classifier
#[derive(Debug, Clone)]
pub struct Trainer {
    boosting: GradientBoostingConfig,
    validation_split: f64,
    random_seed: u64,
    min_feature_columns: usize,
}

impl Trainer {
    pub fn new(boosting: GradientBoostingConfig, validation_split: f64, random_seed: u64) -> Self {
        Self {
            boosting,
            validation_split,
            random_seed,
            min_feature_columns: 10,
        }
    }

    /// Create a trainer from the service configuration
    pub fn from_config(config: &ScreeningConfig) -> Self {
        Self {
            boosting: config.boosting.clone(),
            validation_split: config.validation_split,
            random_seed: config.random_seed,
            min_feature_columns: config.min_feature_columns,
        }
    }

    /// Set the minimum number of feature columns a schema must carry
    pub fn with_min_feature_columns(mut self, min: usize) -> Self {
        self.min_feature_columns = min;
        self
    }

    /// Train on a validated dataset
    pub fn train_dataset(&self, dataset: &ScreeningDataset) -> Result<TrainingOutput> {
        self.train(&dataset.frame, &dataset.schema)
    }

    /// Encode, split, fit and evaluate.
    ///
    /// Fails with a clear error rather than returning a partially fitted model.
    pub fn train(&self, frame: &DataFrame, schema: &DatasetSchema) -> Result<TrainingOutput> {
        let start = Instant::now();

        if schema.width() < self.min_feature_columns {
            return Err(ScreeningError::InsufficientFeatures {
                found: schema.width(),
                expected: CANONICAL_FEATURES.len(),
                required: self.min_feature_columns,
            });
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(ScreeningError::ConfigError(
                "validation_split must be in (0, 1)".to_string(),
            ));
        }

        let (x, feature_encoders) = encode_features(frame, &schema.feature_columns)?;
        let (labels, target) = encode_target(frame, &schema.target_column)?;

        let counts = class_counts(&labels, target.n_classes());
        if let Some(class) = counts.iter().position(|&n| n < 2) {
            return Err(ScreeningError::TrainingError(format!(
                "class {:?} has {} row(s); at least 2 per class are needed for a stratified split",
                target.inverse_transform(class).unwrap_or("?"),
                counts[class]
            )));
        }

        let (train_idx, test_idx) =
            stratified_split(&labels, self.validation_split, self.random_seed);
        debug!(train = train_idx.len(), test = test_idx.len(), "Stratified split");

        let x_train = select_rows(&x, &train_idx);
        let x_test = select_rows(&x, &test_idx);
        let y_train: Array1<f64> = train_idx.iter().map(|&i| labels[i] as f64).collect();
        let y_test: Vec<usize> = test_idx.iter().map(|&i| labels[i]).collect();

        let mut classifier = GradientBoostingClassifier::new(self.boosting.clone());
        classifier
            .fit(&x_train, &y_train)
            .map_err(|e| ScreeningError::TrainingError(format!("fit failed: {}", e)))?;
        let model = ScreeningModel::GradientBoosting(classifier);

        let y_pred = model.predict(&x_test)?.to_vec();
        let mut metrics = TrainingMetrics::compute_weighted(&y_test, &y_pred, target.n_classes());
        metrics.n_train = train_idx.len();
        metrics.n_features = x.ncols();
        metrics.training_time_secs = start.elapsed().as_secs_f64();

        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1_score,
            n_train = metrics.n_train,
            n_test = metrics.n_test,
            "Model trained"
        );

        let encoders = EncoderSet::new(schema.feature_columns.clone(), feature_encoders, Some(target))?;

        Ok(TrainingOutput {
            model,
            encoders,
            metrics,
        })
    }
}

/// Fit a classifier on random binary questionnaire answers.
///
/// Used when no real dataset can be trained on; its predictions carry no
/// signal and it exposes no feature importances.
pub fn default_model(rows: usize, seed: u64) -> Result<(ScreeningModel, EncoderSet)> {
    if rows == 0 {
        return Err(ScreeningError::ConfigError(
            "default_model_rows must be at least 1".to_string(),
        ));
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let width = QUESTION_COLUMNS.len();
    let x = Array2::from_shape_fn((rows, width), |_| f64::from(rng.gen_range(0..2u8)));
    let y: Array1<f64> = (0..rows).map(|_| f64::from(rng.gen_range(0..2u8))).collect();

    let mut model = LogisticRegression::new();
    model.fit(&x, &y)?;

    Ok((ScreeningModel::Logistic(model), EncoderSet::questionnaire_only()))
}

/// Stratified split of row indices into `(train, test)`.
///
/// Each class is shuffled independently and contributes `round(n * fraction)`
/// rows to the test side, clamped so both sides keep at least one row of
/// every class with two or more rows. Both index lists come back sorted.
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for indices in by_class.values_mut() {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Build the feature matrix, fitting an encoder for every text column
fn encode_features(
    frame: &DataFrame,
    columns: &[String],
) -> Result<(Array2<f64>, BTreeMap<String, CategoryEncoder>)> {
    let mut encoders = BTreeMap::new();
    let mut col_data: Vec<Vec<f64>> = Vec::with_capacity(columns.len());

    for name in columns {
        let values = ColumnValues::read(frame, name)?;
        let encoded = match values {
            ColumnValues::Numeric(v) => v
                .into_iter()
                .map(|x| x.filter(|x| x.is_finite()))
                .collect::<Option<Vec<f64>>>(),
            ColumnValues::Text(v) => {
                let present: Vec<String> = v.iter().flatten().cloned().collect();
                if present.len() != v.len() {
                    None
                } else {
                    let encoder = CategoryEncoder::fit(&present)?;
                    let codes = present
                        .iter()
                        .map(|s| encoder.transform(s).map(|c| c as f64))
                        .collect::<Option<Vec<f64>>>();
                    encoders.insert(name.clone(), encoder);
                    codes
                }
            }
        };
        let encoded = encoded.ok_or_else(|| {
            ScreeningError::TrainingError(format!("column {} contains missing values", name))
        })?;
        col_data.push(encoded);
    }

    let n_rows = frame.height();
    let x = Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| col_data[c][r]);
    Ok((x, encoders))
}

/// Encode the target column; exactly two classes are required
fn encode_target(frame: &DataFrame, target_column: &str) -> Result<(Vec<usize>, CategoryEncoder)> {
    let labels: Vec<String> = ColumnValues::read(frame, target_column)?
        .as_labels()
        .into_iter()
        .map(|l| {
            l.map(|l| normalize_label(&l)).ok_or_else(|| {
                ScreeningError::TrainingError(format!(
                    "target column {} contains missing values",
                    target_column
                ))
            })
        })
        .collect::<Result<_>>()?;

    let distinct: HashSet<&str> = labels.iter().map(String::as_str).collect();
    if distinct.len() != 2 {
        return Err(ScreeningError::TrainingError(format!(
            "expected 2 target classes, found {}",
            distinct.len()
        )));
    }

    let encoder = CategoryEncoder::fit(&labels)?;
    let encoded = labels
        .iter()
        .map(|l| {
            encoder
                .transform(l)
                .ok_or_else(|| ScreeningError::TrainingError(format!("unencodable label {}", l)))
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok((encoded, encoder))
}

fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &l in labels {
        if l < n_classes {
            counts[l] += 1;
        }
    }
    counts
}

fn select_rows(x: &Array2<f64>, rows: &[usize]) -> Array2<f64> {
    x.select(ndarray::Axis(0), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame() -> (DataFrame, DatasetSchema) {
        let n = 40;
        let mut cols: Vec<Column> = Vec::new();
        for (j, name) in QUESTION_COLUMNS.iter().enumerate() {
            let values: Vec<f64> = (0..n).map(|i| ((i + j) % 2) as f64).collect();
            cols.push(Series::new((*name).into(), values).into());
        }
        let sex: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "f" } else { "m" }).collect();
        cols.push(Series::new("Sex".into(), sex).into());
        let target: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Yes" } else { "No" }).collect();
        cols.push(Series::new("Class/ASD".into(), target).into());

        let mut feature_columns: Vec<String> = QUESTION_COLUMNS.iter().map(|c| c.to_string()).collect();
        feature_columns.push("Sex".to_string());

        (
            DataFrame::new(cols).unwrap(),
            DatasetSchema {
                target_column: "Class/ASD".to_string(),
                feature_columns,
            },
        )
    }

    fn small_trainer() -> Trainer {
        Trainer::new(
            GradientBoostingConfig {
                n_estimators: 10,
                max_depth: 3,
                ..Default::default()
            },
            0.2,
            42,
        )
    }

    #[test]
    fn test_train_produces_paired_encoders() {
        let (df, schema) = create_test_frame();
        let output = small_trainer().train(&df, &schema).unwrap();

        assert_eq!(output.model.n_features(), 11);
        assert_eq!(output.encoders.width(), 11);
        assert!(output.encoders.feature("Sex").is_some());
        assert_eq!(output.encoders.target().unwrap().classes(), &["No", "Yes"]);
        assert_eq!(output.metrics.n_train + output.metrics.n_test, 40);
        assert!(output.metrics.accuracy > 0.9);
    }

    #[test]
    fn test_insufficient_schema_rejected() {
        let (df, mut schema) = create_test_frame();
        schema.feature_columns.truncate(8);
        let err = small_trainer().train(&df, &schema).unwrap_err();
        assert!(matches!(err, ScreeningError::InsufficientFeatures { found: 8, .. }));
    }

    #[test]
    fn test_single_class_rejected() {
        let (mut df, schema) = create_test_frame();
        df.with_column(Series::new("Class/ASD".into(), vec!["Yes"; 40])).unwrap();
        let err = small_trainer().train(&df, &schema).unwrap_err();
        assert!(matches!(err, ScreeningError::TrainingError(_)));
    }

    #[test]
    fn test_stratified_split_keeps_every_class() {
        let labels: Vec<usize> = (0..50).map(|i| usize::from(i < 5)).collect();
        let (train, test) = stratified_split(&labels, 0.2, 1);

        assert_eq!(train.len() + test.len(), 50);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 1);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 0).count(), 9);
        assert!(train.iter().all(|i| !test.contains(i)));
    }

    #[test]
    fn test_stratified_split_is_seeded() {
        let labels: Vec<usize> = (0..30).map(|i| i % 3).collect();
        assert_eq!(stratified_split(&labels, 0.3, 9), stratified_split(&labels, 0.3, 9));
    }

    #[test]
    fn test_default_model_is_questionnaire_only() {
        let (model, encoders) = default_model(100, 42).unwrap();
        assert_eq!(model.n_features(), 10);
        assert_eq!(encoders.width(), 10);
        assert!(model.feature_importances().is_none());
        assert!(default_model(0, 42).is_err());
    }
}
