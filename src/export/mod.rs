//! Model persistence
//!
//! The fitted model and its encoder set are written as two co-located
//! artifacts and only ever loaded together.

mod serializer;
mod store;

pub use serializer::{ArtifactEnvelope, ArtifactKind};
pub use store::{ModelStore, PersistedPair};
