//! Shared error types for the services crate.
//!
//! The progress store's own read/write API is deliberately infallible:
//! storage failures degrade to warnings and the in-memory document stays
//! authoritative. Errors only exist at composition time.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
