use chrono::{DateTime, Utc};

use crate::model::SubjectId;

/// Kind of record behind a recent-activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityKind {
    Chapter,
    Quiz,
}

impl ActivityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Chapter => "chapter",
            ActivityKind::Quiz => "quiz",
        }
    }
}

/// One row of the merged recent-activity feed.
///
/// Entries are ordered newest-first with a deterministic tie-break
/// (subject, kind, id), so two calls on the same state agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: String,
    pub subject: SubjectId,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
}
