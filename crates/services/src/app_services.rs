use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;

/// Assembles the app-facing services around one shared progress store.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and resolve the stored
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails. A
    /// corrupt or missing document is not an error; the store falls back
    /// to the bootstrap default.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(clock, &storage).await)
    }

    /// Build services over an in-memory slot (tests, previews).
    pub async fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory()).await
    }

    async fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        progress.init().await;
        Self { progress }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}
