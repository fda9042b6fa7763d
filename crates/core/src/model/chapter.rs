use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-chapter record, created on the first write touching the chapter.
///
/// `time_spent` is cumulative across every visit; only a full progress
/// reset brings it back to zero. The field mirrors what callers submit:
/// pages read the stored total, add their locally accumulated seconds and
/// write back the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterProgress {
    pub completed: bool,
    pub time_spent: u64,
    pub last_accessed: DateTime<Utc>,
}

impl ChapterProgress {
    /// Fresh record for a chapter seen for the first time.
    #[must_use]
    pub fn first_visit(now: DateTime<Utc>) -> Self {
        Self {
            completed: false,
            time_spent: 0,
            last_accessed: now,
        }
    }
}

/// Field-wise patch for a chapter record.
///
/// Absent fields keep their stored value; `time_spent` carries the caller's
/// already-summed total (replace, not add). Applying the same patch twice
/// yields the same record apart from `last_accessed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterPatch {
    pub completed: Option<bool>,
    pub time_spent: Option<u64>,
}

impl ChapterPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion toggle.
    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Sets the cumulative time total, in seconds.
    #[must_use]
    pub fn with_time_spent(mut self, total_seconds: u64) -> Self {
        self.time_spent = Some(total_seconds);
        self
    }

    pub(crate) fn apply(self, record: &mut ChapterProgress, now: DateTime<Utc>) {
        if let Some(completed) = self.completed {
            record.completed = completed;
        }
        if let Some(total) = self.time_spent {
            record.time_spent = total;
        }
        record.last_accessed = now;
    }
}
