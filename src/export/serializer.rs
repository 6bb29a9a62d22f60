//! Artifact envelope for persisted models and encoders
//!
//! Every artifact is a bincode-encoded [`ArtifactEnvelope`] wrapping the
//! bincode payload of the fitted object. The envelope carries the format
//! magic and version, what kind of artifact it holds, the pairing id shared
//! by the model and encoder artifacts of one training run, and an xxh3
//! checksum of the payload.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Result, ScreeningError};

/// What an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Model,
    Encoders,
}

/// Framed, checksummed artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    magic: [u8; 4],
    format_version: u32,
    kind: ArtifactKind,
    pairing_id: Uuid,
    created_at: DateTime<Utc>,
    payload: Vec<u8>,
    checksum: u64,
}

impl ArtifactEnvelope {
    const MAGIC: [u8; 4] = *b"ASDS";
    const VERSION: u32 = 1;

    /// Serialize `value` into a new envelope
    pub fn seal<T: Serialize>(kind: ArtifactKind, pairing_id: Uuid, value: &T) -> Result<Self> {
        let payload = bincode::serialize(value)?;
        Ok(Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            kind,
            pairing_id,
            created_at: Utc::now(),
            checksum: xxh3_64(&payload),
            payload,
        })
    }

    /// Verify the frame and deserialize the payload
    pub fn open<T: DeserializeOwned>(&self, expected: ArtifactKind) -> Result<T> {
        if self.magic != Self::MAGIC {
            return Err(mismatch("unrecognized artifact format"));
        }
        if self.format_version != Self::VERSION {
            return Err(mismatch(format!(
                "unsupported format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if self.kind != expected {
            return Err(mismatch(format!(
                "expected a {:?} artifact, found {:?}",
                expected, self.kind
            )));
        }
        if xxh3_64(&self.payload) != self.checksum {
            return Err(mismatch(format!("{:?} artifact failed its checksum", self.kind)));
        }
        bincode::deserialize(&self.payload)
            .map_err(|e| mismatch(format!("{:?} payload is unreadable: {}", self.kind, e)))
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn pairing_id(&self) -> Uuid {
        self.pairing_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Encode the whole envelope
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode an envelope; any failure is reported as a persistence mismatch
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| mismatch(format!("corrupt artifact: {}", e)))
    }

    /// Write to a temporary sibling, then rename over `path`
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.to_bytes()?;
        let tmp = temp_sibling(path);
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            ScreeningError::IoError(e)
        })
    }

    /// Read an envelope from disk
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| mismatch(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn mismatch(reason: impl Into<String>) -> ScreeningError {
    ScreeningError::PersistenceMismatch(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let id = Uuid::new_v4();
        let env = ArtifactEnvelope::seal(ArtifactKind::Encoders, id, &vec![1u32, 2, 3]).unwrap();
        let bytes = env.to_bytes().unwrap();
        let back = ArtifactEnvelope::from_bytes(&bytes).unwrap();
        assert_eq!(back.pairing_id(), id);
        let value: Vec<u32> = back.open(ArtifactKind::Encoders).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }

    #[test]
    fn test_wrong_kind_is_mismatch() {
        let env = ArtifactEnvelope::seal(ArtifactKind::Model, Uuid::new_v4(), &7u8).unwrap();
        let err = env.open::<u8>(ArtifactKind::Encoders).unwrap_err();
        assert!(matches!(err, ScreeningError::PersistenceMismatch(_)));
    }

    #[test]
    fn test_tampered_payload_fails_checksum() {
        let mut env = ArtifactEnvelope::seal(ArtifactKind::Model, Uuid::new_v4(), &vec![9u64; 4]).unwrap();
        env.payload[0] ^= 0xff;
        let err = env.open::<Vec<u64>>(ArtifactKind::Model).unwrap_err();
        assert!(matches!(err, ScreeningError::PersistenceMismatch(_)));
    }

    #[test]
    fn test_garbage_bytes() {
        let err = ArtifactEnvelope::from_bytes(b"not an artifact").unwrap_err();
        assert!(matches!(err, ScreeningError::PersistenceMismatch(_)));
    }

    #[test]
    fn test_temp_sibling() {
        let tmp = temp_sibling(Path::new("/m/model.bin"));
        assert_eq!(tmp, PathBuf::from("/m/model.bin.tmp"));
    }
}
