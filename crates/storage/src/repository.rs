use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use revise_core::model::UserProgress;

use crate::codec;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the single persisted progress document.
///
/// One logical slot per device: `save` atomically replaces the previous
/// document, `load` yields `None` when the slot was never written or was
/// cleared, and `clear` is the full progress reset. Backends never repair
/// a corrupt slot themselves; they surface the error and leave the
/// fallback decision to the service layer.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read and decode the stored document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a corrupt payload, or
    /// other storage errors when the slot cannot be read.
    async fn load(&self) -> Result<Option<UserProgress>, StorageError>;

    /// Encode and write the full document in a single slot write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save(&self, progress: &UserProgress) -> Result<(), StorageError>;

    /// Empty the slot entirely; the next `load` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory slot implementation for testing and prototyping.
///
/// Stores the *encoded* document rather than the decoded value, so tests
/// can inject malformed payloads and exercise the fail-soft load path end
/// to end.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the slot with a raw payload, bypassing the codec.
    #[must_use]
    pub fn with_raw_document(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Raw payload currently stored, if any.
    #[must_use]
    pub fn raw_document(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load(&self) -> Result<Option<UserProgress>, StorageError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.as_deref().map(codec::decode).transpose()
    }

    async fn save(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let encoded = codec::encode(progress)?;
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates the progress slot behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}
