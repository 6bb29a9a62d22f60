//! Paired model + encoder persistence

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::serializer::{ArtifactEnvelope, ArtifactKind};
use crate::config::ScreeningConfig;
use crate::error::{Result, ScreeningError};
use crate::preprocessing::EncoderSet;
use crate::training::ScreeningModel;

/// A model and the encoder set it was trained with, as read from disk
#[derive(Debug, Clone)]
pub struct PersistedPair {
    pub model: ScreeningModel,
    pub encoders: EncoderSet,
    pub pairing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Saves and loads the model/encoder pair as one unit
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_path: PathBuf,
    encoder_path: PathBuf,
}

impl ModelStore {
    pub fn new(model_path: impl Into<PathBuf>, encoder_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            encoder_path: encoder_path.into(),
        }
    }

    pub fn from_config(config: &ScreeningConfig) -> Self {
        Self::new(config.model_path(), config.encoder_path())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn encoder_path(&self) -> &Path {
        &self.encoder_path
    }

    /// Whether both artifacts are present
    pub fn exists(&self) -> bool {
        self.model_path.is_file() && self.encoder_path.is_file()
    }

    /// Persist both artifacts under a fresh pairing id
    pub fn save(&self, model: &ScreeningModel, encoders: &EncoderSet) -> Result<Uuid> {
        if model.n_features() != encoders.width() {
            return Err(ScreeningError::ShapeError {
                expected: format!("{} features", encoders.width()),
                actual: format!("{} features", model.n_features()),
            });
        }

        let pairing_id = Uuid::new_v4();
        let encoder_env = ArtifactEnvelope::seal(ArtifactKind::Encoders, pairing_id, encoders)?;
        let model_env = ArtifactEnvelope::seal(ArtifactKind::Model, pairing_id, model)?;

        encoder_env.write_atomic(&self.encoder_path)?;
        model_env.write_atomic(&self.model_path)?;

        info!(
            model = %self.model_path.display(),
            encoders = %self.encoder_path.display(),
            pairing_id = %pairing_id,
            "Model and encoders saved"
        );
        Ok(pairing_id)
    }

    /// Load both artifacts or neither.
    ///
    /// Any missing, unreadable or mismatched artifact yields
    /// [`ScreeningError::PersistenceMismatch`].
    pub fn load(&self) -> Result<PersistedPair> {
        for path in [&self.model_path, &self.encoder_path] {
            if !path.is_file() {
                return Err(ScreeningError::PersistenceMismatch(format!(
                    "{} is missing",
                    path.display()
                )));
            }
        }

        let model_env = ArtifactEnvelope::read(&self.model_path)?;
        let encoder_env = ArtifactEnvelope::read(&self.encoder_path)?;

        if model_env.pairing_id() != encoder_env.pairing_id() {
            return Err(ScreeningError::PersistenceMismatch(format!(
                "model {} and encoders {} come from different training runs",
                model_env.pairing_id(),
                encoder_env.pairing_id()
            )));
        }

        let model: ScreeningModel = model_env.open(ArtifactKind::Model)?;
        let encoders: EncoderSet = encoder_env.open(ArtifactKind::Encoders)?;

        if model.n_features() != encoders.width() {
            return Err(ScreeningError::PersistenceMismatch(format!(
                "model expects {} features but the encoder schema has {}",
                model.n_features(),
                encoders.width()
            )));
        }

        debug!(pairing_id = %model_env.pairing_id(), "Loaded persisted pair");
        Ok(PersistedPair {
            model,
            encoders,
            pairing_id: model_env.pairing_id(),
            created_at: model_env.created_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::default_model;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ModelStore {
        ModelStore::new(dir.join("m.bin"), dir.join("e.bin"))
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let (model, encoders) = default_model(20, 1).unwrap();

        let id = store.save(&model, &encoders).unwrap();
        assert!(store.exists());

        let pair = store.load().unwrap();
        assert_eq!(pair.pairing_id, id);
        assert_eq!(pair.encoders, encoders);
    }

    #[test]
    fn test_missing_encoder_file_rejects_pair() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let (model, encoders) = default_model(20, 1).unwrap();
        store.save(&model, &encoders).unwrap();

        std::fs::remove_file(store.encoder_path()).unwrap();
        assert!(matches!(store.load(), Err(ScreeningError::PersistenceMismatch(_))));
    }

    #[test]
    fn test_pairing_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let (model, encoders) = default_model(20, 1).unwrap();

        store.save(&model, &encoders).unwrap();
        let first_encoders = std::fs::read(store.encoder_path()).unwrap();
        store.save(&model, &encoders).unwrap();
        std::fs::write(store.encoder_path(), first_encoders).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, ScreeningError::PersistenceMismatch(_)));
    }

    #[test]
    fn test_truncated_model_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let (model, encoders) = default_model(20, 1).unwrap();
        store.save(&model, &encoders).unwrap();

        let bytes = std::fs::read(store.model_path()).unwrap();
        std::fs::write(store.model_path(), &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(store.load(), Err(ScreeningError::PersistenceMismatch(_))));
    }
}
