//! Integration test: training pipeline end-to-end

mod common;

use asd_screen::bootstrap::{train_and_save, train_from_dataset};
use asd_screen::dataset::{DatasetLoader, POSITIVE_LABEL};
use asd_screen::error::ScreeningError;
use asd_screen::export::ModelStore;
use asd_screen::training::{stratified_split, Trainer};
use common::{test_config, SyntheticCsv};
use tempfile::tempdir;

// ============================================================================
// Trainer
// ============================================================================

#[test]
fn test_train_from_csv() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default().write(dir.path());
    let config = test_config(dir.path(), &data);

    let output = train_from_dataset(&config).unwrap();

    assert_eq!(output.model.n_features(), 14);
    assert_eq!(output.encoders.width(), 14);
    assert_eq!(output.metrics.n_train + output.metrics.n_test, 240);
    assert_eq!(output.metrics.n_features, 14);
    for score in [
        output.metrics.accuracy,
        output.metrics.precision,
        output.metrics.recall,
        output.metrics.f1_score,
    ] {
        assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
    }
    // labels are a threshold on the answers, so boosting should learn them
    assert!(output.metrics.accuracy > 0.8, "accuracy {}", output.metrics.accuracy);
}

#[test]
fn test_encoders_cover_text_columns_and_target() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default().write(dir.path());
    let output = train_from_dataset(&test_config(dir.path(), &data)).unwrap();

    let categorical: Vec<&str> = output.encoders.categorical_columns().collect();
    for column in ["Sex", "Jaundice", "Family_mem_with_ASD"] {
        assert!(categorical.contains(&column), "{column} has no encoder");
    }
    assert!(output.encoders.feature("A1").is_none());

    let target = output.encoders.target().unwrap();
    assert_eq!(target.classes(), &["No".to_string(), "Yes".to_string()]);
    assert_eq!(target.inverse_transform(1), Some(POSITIVE_LABEL));
}

#[test]
fn test_training_is_deterministic() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default().write(dir.path());
    let config = test_config(dir.path(), &data);

    let a = train_from_dataset(&config).unwrap();
    let b = train_from_dataset(&config).unwrap();

    assert_eq!(a.metrics.accuracy, b.metrics.accuracy);
    assert_eq!(a.model.feature_importances(), b.model.feature_importances());
}

#[test]
fn test_reduced_schema_trains_on_available_columns() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default()
        .without(&["Sex", "Jaundice"])
        .write(dir.path());

    let output = train_from_dataset(&test_config(dir.path(), &data)).unwrap();
    assert_eq!(output.encoders.width(), 12);
    assert_eq!(output.model.n_features(), 12);
}

#[test]
fn test_single_class_dataset_fails() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default()
        .with_positive_rate(1.0)
        .write(dir.path());

    let err = train_from_dataset(&test_config(dir.path(), &data)).unwrap_err();
    assert!(matches!(err, ScreeningError::TrainingError(_)));
}

#[test]
fn test_trainer_rejects_narrow_schema() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default()
        .without(&["Jaundice", "Family_mem_with_ASD"])
        .write(dir.path());
    let config = test_config(dir.path(), &data);
    let dataset = DatasetLoader::from_config(&config).unwrap().load(&data).unwrap();

    let err = Trainer::from_config(&config)
        .with_min_feature_columns(13)
        .train_dataset(&dataset)
        .unwrap_err();
    assert!(matches!(err, ScreeningError::InsufficientFeatures { found: 12, .. }));
}

// ============================================================================
// Stratified split
// ============================================================================

#[test]
fn test_stratified_split_keeps_imbalance() {
    // 90/10 imbalance
    let labels: Vec<usize> = (0..500).map(|i| usize::from(i % 10 == 0)).collect();
    let (train, test) = stratified_split(&labels, 0.2, 42);

    assert_eq!(train.len() + test.len(), labels.len());
    assert_eq!(test.len(), 100);

    let share = |rows: &[usize]| {
        rows.iter().filter(|&&i| labels[i] == 1).count() as f64 / rows.len() as f64
    };
    assert!((share(&test) - 0.1).abs() <= 0.03, "test share {}", share(&test));
    assert!((share(&train) - 0.1).abs() <= 0.03, "train share {}", share(&train));
}

#[test]
fn test_imbalanced_dataset_trains() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default()
        .with_rows(300)
        .with_positive_rate(0.1)
        .write(dir.path());

    let output = train_from_dataset(&test_config(dir.path(), &data)).unwrap();
    assert_eq!(output.metrics.n_test, 60);
    assert_eq!(output.metrics.n_train, 240);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_train_and_save_writes_a_loadable_pair() {
    let dir = tempdir().unwrap();
    let data = SyntheticCsv::default().write(dir.path());
    let config = test_config(dir.path(), &data);

    let (output, pairing_id) = train_and_save(&config).unwrap();

    let store = ModelStore::from_config(&config);
    assert!(store.exists());
    let pair = store.load().unwrap();
    assert_eq!(pair.pairing_id, pairing_id);
    assert_eq!(pair.encoders, output.encoders);
    assert_eq!(pair.model.n_features(), output.model.n_features());
}
