//! Load-or-train bootstrap and the service readiness gate
//!
//! [`ScreeningService`] is constructed explicitly and handed to callers; it
//! owns the one model + encoder pair for the process. `bootstrap` walks
//! `Uninitialized -> TryLoad -> Training -> Ready`, falling back to the
//! synthetic default model when training is impossible, and always ends in
//! `Ready`. Until then inference fails fast with the retryable
//! [`ScreeningError::ModelNotReady`], or callers may block in
//! [`ScreeningService::wait_ready`].

use ndarray::Array1;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ScreeningConfig;
use crate::dataset::{DatasetLoader, QUESTION_COUNT};
use crate::error::{Result, ScreeningError};
use crate::export::ModelStore;
use crate::inference::{BehavioralAnalysis, InferenceEngine, ScreeningResult};
use crate::preprocessing::{EncoderSet, RawStudentInput};
use crate::training::{default_model, LogisticRegression, ScreeningModel, Trainer, TrainingOutput};

/// Bootstrap lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    Uninitialized,
    TryLoad,
    Training,
    Ready,
}

/// How the service obtained its model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// Persisted pair loaded from the model directory
    Loaded { pairing_id: Uuid },
    /// Trained from the reference dataset
    Trained {
        metrics: crate::training::TrainingMetrics,
        /// `None` when the pair could not be written
        pairing_id: Option<Uuid>,
    },
    /// Serving the synthetic default model
    Degraded { reason: String },
}

impl BootstrapOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, BootstrapOutcome::Degraded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            BootstrapOutcome::Loaded { .. } => "loaded",
            BootstrapOutcome::Trained { .. } => "trained",
            BootstrapOutcome::Degraded { .. } => "degraded",
        }
    }
}

#[derive(Debug)]
struct Gate {
    state: BootstrapState,
    engine: Option<Arc<InferenceEngine>>,
    outcome: Option<BootstrapOutcome>,
}

/// Screening service handle with a readiness gate
#[derive(Debug)]
pub struct ScreeningService {
    config: ScreeningConfig,
    store: ModelStore,
    gate: Mutex<Gate>,
    ready: Condvar,
}

impl ScreeningService {
    /// Create a service; the configuration is validated here.
    pub fn new(config: ScreeningConfig) -> Result<Self> {
        config.validate()?;
        let store = ModelStore::from_config(&config);
        Ok(Self {
            config,
            store,
            gate: Mutex::new(Gate {
                state: BootstrapState::Uninitialized,
                engine: None,
                outcome: None,
            }),
            ready: Condvar::new(),
        })
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    pub fn state(&self) -> BootstrapState {
        self.gate.lock().state
    }

    /// Outcome of the completed bootstrap, if any
    pub fn outcome(&self) -> Option<BootstrapOutcome> {
        self.gate.lock().outcome.clone()
    }

    pub fn is_degraded(&self) -> bool {
        self.outcome().map_or(false, |o| o.is_degraded())
    }

    /// Bring the service to `Ready`.
    ///
    /// Runs the lifecycle once; later calls, and calls that race the first
    /// one, return the same outcome without touching the held model.
    pub fn bootstrap(&self) -> BootstrapOutcome {
        {
            let mut gate = self.gate.lock();
            loop {
                match gate.state {
                    BootstrapState::Uninitialized => {
                        gate.state = BootstrapState::TryLoad;
                        break;
                    }
                    BootstrapState::Ready => {
                        if let Some(outcome) = gate.outcome.clone() {
                            return outcome;
                        }
                        break;
                    }
                    BootstrapState::TryLoad | BootstrapState::Training => {
                        self.ready.wait(&mut gate);
                    }
                }
            }
        }

        let started = Instant::now();
        let in_flight = InFlight { service: self };
        let (engine, outcome) = self.run_lifecycle();
        std::mem::forget(in_flight);

        match &outcome {
            BootstrapOutcome::Degraded { reason } => warn!(
                reason = %reason,
                "Screening service is DEGRADED: serving the synthetic default model until a dataset is supplied"
            ),
            other => info!(
                outcome = other.label(),
                features = engine.schema().len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Screening service ready"
            ),
        }

        let mut gate = self.gate.lock();
        gate.engine = Some(Arc::new(engine));
        gate.outcome = Some(outcome.clone());
        gate.state = BootstrapState::Ready;
        self.ready.notify_all();
        outcome
    }

    /// Engine handle; fails fast before bootstrap completes
    pub fn engine(&self) -> Result<Arc<InferenceEngine>> {
        let gate = self.gate.lock();
        match (&gate.state, &gate.engine) {
            (BootstrapState::Ready, Some(engine)) => Ok(Arc::clone(engine)),
            _ => Err(ScreeningError::ModelNotReady),
        }
    }

    /// Block until the service is ready or `timeout` elapses
    pub fn wait_ready(&self, timeout: Duration) -> Result<Arc<InferenceEngine>> {
        let deadline = Instant::now() + timeout;
        let mut gate = self.gate.lock();
        loop {
            if let (BootstrapState::Ready, Some(engine)) = (&gate.state, &gate.engine) {
                return Ok(Arc::clone(engine));
            }
            if self.ready.wait_until(&mut gate, deadline).timed_out() {
                return match (&gate.state, &gate.engine) {
                    (BootstrapState::Ready, Some(engine)) => Ok(Arc::clone(engine)),
                    _ => Err(ScreeningError::ModelNotReady),
                };
            }
        }
    }

    /// Screen one request against the ready model
    pub fn predict(&self, raw: &RawStudentInput) -> Result<ScreeningResult> {
        self.engine()?.predict(raw)
    }

    /// Screen a loosely-typed mapping through the behavioral wrapper
    pub fn analyze_behavioral_features(&self, data: &Map<String, Value>) -> Result<BehavioralAnalysis> {
        self.engine()?.analyze_behavioral_features(data)
    }

    fn set_state(&self, state: BootstrapState) {
        self.gate.lock().state = state;
    }

    fn run_lifecycle(&self) -> (InferenceEngine, BootstrapOutcome) {
        info!(model = %self.store.model_path().display(), "Bootstrap: loading persisted model");
        match self.load_persisted() {
            Ok((engine, pairing_id)) => {
                return (engine, BootstrapOutcome::Loaded { pairing_id });
            }
            Err(e) => {
                warn!(reason = %e, "Persisted model unusable, training from dataset");
            }
        }

        self.set_state(BootstrapState::Training);
        match self.train_fresh() {
            Ok((engine, outcome)) => (engine, outcome),
            Err(e) => {
                error!(error = %e, "Training failed, falling back to the default model");
                (self.degraded_engine(), BootstrapOutcome::Degraded { reason: e.to_string() })
            }
        }
    }

    fn load_persisted(&self) -> Result<(InferenceEngine, Uuid)> {
        let pair = self.store.load()?;
        let engine = InferenceEngine::new(pair.model, pair.encoders, self.config.inference.clone())
            .map_err(|e| ScreeningError::PersistenceMismatch(e.to_string()))?;
        info!(pairing_id = %pair.pairing_id, created_at = %pair.created_at, "Loaded persisted model");
        Ok((engine, pair.pairing_id))
    }

    fn train_fresh(&self) -> Result<(InferenceEngine, BootstrapOutcome)> {
        let output = train_from_dataset(&self.config)?;

        let pairing_id = match self.store.save(&output.model, &output.encoders) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Could not persist the trained model; it will be retrained next start");
                None
            }
        };

        let engine = InferenceEngine::new(output.model, output.encoders, self.config.inference.clone())?;
        Ok((
            engine,
            BootstrapOutcome::Trained {
                metrics: output.metrics,
                pairing_id,
            },
        ))
    }

    /// The default model is never persisted, so the next start retries training
    fn degraded_engine(&self) -> InferenceEngine {
        let built = default_model(self.config.default_model_rows, self.config.random_seed)
            .and_then(|(model, encoders)| {
                InferenceEngine::new(model, encoders, self.config.inference.clone())
            });

        let engine = match built {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "Default model could not be fitted, using a neutral model");
                neutral_engine(&self.config)
            }
        };
        engine.with_degraded(true)
    }
}

/// Returns the gate to `Uninitialized` if the lifecycle unwinds, so waiters
/// retry instead of blocking forever
struct InFlight<'a> {
    service: &'a ScreeningService,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        error!("Bootstrap aborted, releasing the readiness gate");
        let mut gate = self.service.gate.lock();
        gate.state = BootstrapState::Uninitialized;
        self.service.ready.notify_all();
    }
}

/// Validate the configured dataset and train on it, without any fallback
pub fn train_from_dataset(config: &ScreeningConfig) -> Result<TrainingOutput> {
    let loader = DatasetLoader::from_config(config)?;
    let dataset = loader.load(&config.dataset_path)?;
    if dataset.rows_dropped() > 0 {
        warn!(dropped = dataset.rows_dropped(), "Dropped rows with missing values");
    }
    Trainer::from_config(config).train_dataset(&dataset)
}

/// Train from the configured dataset and persist the pair
pub fn train_and_save(config: &ScreeningConfig) -> Result<(TrainingOutput, Uuid)> {
    let output = train_from_dataset(config)?;
    let pairing_id = ModelStore::from_config(config).save(&output.model, &output.encoders)?;
    Ok((output, pairing_id))
}

/// Zero-weight questionnaire model answering 0.5 for every request
fn neutral_engine(config: &ScreeningConfig) -> InferenceEngine {
    let model = ScreeningModel::Logistic(LogisticRegression::with_coefficients(
        Array1::zeros(QUESTION_COUNT),
        0.0,
    ));
    InferenceEngine::from_parts(model, EncoderSet::questionnaire_only(), config.inference.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_engine_not_ready_before_bootstrap() {
        let dir = tempdir().unwrap();
        let service = ScreeningService::new(
            ScreeningConfig::default()
                .with_model_dir(dir.path())
                .with_dataset_path(dir.path().join("absent.csv")),
        )
        .unwrap();

        assert_eq!(service.state(), BootstrapState::Uninitialized);
        let err = service.engine().unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            service.wait_ready(Duration::from_millis(10)),
            Err(ScreeningError::ModelNotReady)
        ));
    }

    #[test]
    fn test_aborted_bootstrap_releases_waiters() {
        let dir = tempdir().unwrap();
        let service = ScreeningService::new(
            ScreeningConfig::default()
                .with_model_dir(dir.path())
                .with_dataset_path(dir.path().join("absent.csv")),
        )
        .unwrap();
        service.set_state(BootstrapState::TryLoad);

        std::thread::scope(|s| {
            let waiter = s.spawn(|| service.bootstrap());

            let aborted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let _in_flight = InFlight { service: &service };
                panic!("lifecycle aborted");
            }));
            assert!(aborted.is_err());

            assert!(waiter.join().unwrap().is_degraded());
        });
        assert_eq!(service.state(), BootstrapState::Ready);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = ScreeningConfig::default();
        config.validation_split = 0.0;
        assert!(ScreeningService::new(config).is_err());
    }

    #[test]
    fn test_neutral_engine_answers_half() {
        let engine = neutral_engine(&ScreeningConfig::default());
        let raw = RawStudentInput::new(24, "Male", "no", "no").with_answers([1; 10]);
        let result = engine.predict(&raw).unwrap();
        assert_eq!(result.confidence, 0.5);
        assert!(!result.traits_detected);
    }
}
