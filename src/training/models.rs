//! Trained model variants and held-out metrics

use crate::error::Result;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;

/// A fitted binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScreeningModel {
    /// Trained from the reference dataset
    GradientBoosting(GradientBoostingClassifier),
    /// Fallback fitted on synthetic questionnaire data
    Logistic(LogisticRegression),
}

impl ScreeningModel {
    /// Class-probability distribution, one row per sample: `[p(class 0), p(class 1)]`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let positive = match self {
            ScreeningModel::GradientBoosting(m) => m.predict_proba(x)?,
            ScreeningModel::Logistic(m) => m.predict_proba(x)?,
        };
        let negative = positive.mapv(|p| 1.0 - p);
        Ok(ndarray::stack(Axis(1), &[negative.view(), positive.view()])?)
    }

    /// Argmax class index per sample; ties resolve to the lower index
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| argmax(&row.to_vec()))
            .collect())
    }

    /// Per-feature importances, when the model type exposes them
    pub fn feature_importances(&self) -> Option<&[f64]> {
        match self {
            ScreeningModel::GradientBoosting(m) => Some(m.feature_importances()),
            ScreeningModel::Logistic(_) => None,
        }
    }

    /// Number of input features
    pub fn n_features(&self) -> usize {
        match self {
            ScreeningModel::GradientBoosting(m) => m.n_features(),
            ScreeningModel::Logistic(m) => m.n_features(),
        }
    }

    /// Short model family name
    pub fn kind(&self) -> &'static str {
        match self {
            ScreeningModel::GradientBoosting(_) => "gradient_boosting",
            ScreeningModel::Logistic(_) => "logistic_regression",
        }
    }
}

/// Index of the largest value; first occurrence wins
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Held-out classification metrics, support-weighted across classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    /// Weighted precision
    pub precision: f64,
    /// Weighted recall
    pub recall: f64,
    /// Weighted F1
    pub f1_score: f64,
    /// Rows used for fitting
    pub n_train: usize,
    /// Rows held out
    pub n_test: usize,
    pub n_features: usize,
    pub training_time_secs: f64,
}

impl TrainingMetrics {
    /// Compute weighted metrics from true and predicted class indices.
    ///
    /// Per-class scores with a zero denominator count as 0.
    pub fn compute_weighted(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Self {
        let n = y_true.len();
        let mut metrics = Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            n_train: 0,
            n_test: n,
            n_features: 0,
            training_time_secs: 0.0,
        };
        if n == 0 {
            return metrics;
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        metrics.accuracy = correct as f64 / n as f64;

        for class in 0..n_classes {
            let support = y_true.iter().filter(|&&t| t == class).count();
            if support == 0 {
                continue;
            }
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|(&t, &p)| t == class && p == class)
                .count();
            let predicted = y_pred.iter().filter(|&&p| p == class).count();

            let precision = if predicted > 0 { tp as f64 / predicted as f64 } else { 0.0 };
            let recall = tp as f64 / support as f64;
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            let weight = support as f64 / n as f64;
            metrics.precision += weight * precision;
            metrics.recall += weight * recall;
            metrics.f1_score += weight * f1;
        }

        metrics
    }
}
