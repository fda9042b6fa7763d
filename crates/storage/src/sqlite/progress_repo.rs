use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use revise_core::model::UserProgress;

use crate::codec;
use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load(&self) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT document
            FROM user_progress
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document: String = row
            .try_get("document")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        codec::decode(&document).map(Some)
    }

    async fn save(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let document = codec::encode(progress)?;

        sqlx::query(
            r"
            INSERT INTO user_progress (id, document, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(1_i64)
        .bind(&document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM user_progress WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
