//! Model training module
//!
//! Provides:
//! - Gradient-boosted regression-tree ensembles for binary screening
//! - Logistic regression for the synthetic default model
//! - Support-weighted held-out metrics
//! - The trainer that ties encoding, stratified splitting and fitting together

mod engine;
mod models;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;

pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{default_model, stratified_split, Trainer, TrainingOutput};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear_models::LogisticRegression;
pub use models::{argmax, ScreeningModel, TrainingMetrics};
