//! JSON codec for the single persisted progress document.
//!
//! The on-disk schema is the serde shape of [`UserProgress`]: camelCase
//! field names, RFC 3339 timestamps, one document per user. Both the
//! in-memory and `SQLite` repositories funnel through these two functions
//! so every backend writes the identical payload.

use revise_core::model::UserProgress;

use crate::repository::StorageError;

/// Serialize the document for the durable slot.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the document cannot be
/// encoded (not expected for well-formed in-memory state).
pub fn encode(progress: &UserProgress) -> Result<String, StorageError> {
    serde_json::to_string(progress).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Decode a document read back from the slot.
///
/// Derived state is re-established after parsing, so a partial document
/// (e.g. written before a subject existed) comes back with all subject
/// keys seeded and totals that agree with its leaf records.
///
/// # Errors
///
/// Returns `StorageError::Serialization` when the payload is not valid
/// JSON for the document schema. Callers treat that as "slot corrupt" and
/// fall back to the bootstrap default.
pub fn decode(raw: &str) -> Result<UserProgress, StorageError> {
    let mut progress: UserProgress =
        serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))?;
    progress.restore_invariants();
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::model::{ChapterId, ChapterPatch, SubjectId};
    use revise_core::time::fixed_now;

    #[test]
    fn document_round_trips() {
        let mut progress = UserProgress::bootstrap();
        progress.apply_chapter_patch(
            SubjectId::Economie,
            &ChapterId::new("marche-prix"),
            ChapterPatch::new().with_time_spent(42).with_completed(true),
            fixed_now(),
        );

        let decoded = decode(&encode(&progress).unwrap()).unwrap();
        assert_eq!(decoded, progress);
    }

    #[test]
    fn layout_uses_the_documented_field_names() {
        let mut progress = UserProgress::bootstrap();
        progress.apply_chapter_patch(
            SubjectId::Economie,
            &ChapterId::new("marche-prix"),
            ChapterPatch::new().with_time_spent(42),
            fixed_now(),
        );

        let raw = encode(&progress).unwrap();
        for key in [
            "\"subjects\"",
            "\"economie\"",
            "\"science-politique\"",
            "\"chaptersProgress\"",
            "\"quizzesProgress\"",
            "\"overallProgress\"",
            "\"timeSpent\"",
            "\"lastAccessed\"",
            "\"totalTimeSpent\"",
        ] {
            assert!(raw.contains(key), "missing {key} in {raw}");
        }
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let result = decode("{not json");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn partial_document_is_reseeded_on_decode() {
        // A document from a build that only knew one subject.
        let raw = r#"{"subjects":{"economie":{"chaptersProgress":{"ch":{"completed":false,"timeSpent":7,"lastAccessed":"2023-11-14T22:13:20Z"}},"quizzesProgress":{},"overallProgress":0}},"totalTimeSpent":99}"#;

        let decoded = decode(raw).unwrap();

        assert_eq!(decoded.subject(SubjectId::Sociologie).overall_progress(), 0);
        // The stored total disagreed with the chapters; decode repairs it.
        assert_eq!(decoded.total_time_spent(), 7);
    }
}
