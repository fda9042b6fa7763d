use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-quiz record, created on the first submitted attempt.
///
/// `score` holds the most recent submitted score; each completion
/// overwrites it. `attempts` counts every submission, including restarts
/// that reset the score to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgress {
    pub score: u8,
    pub completed: bool,
    pub attempts: u32,
    pub last_accessed: DateTime<Utc>,
}

impl QuizProgress {
    /// Fresh record with no attempts yet.
    #[must_use]
    pub fn first_visit(now: DateTime<Utc>) -> Self {
        Self {
            score: 0,
            completed: false,
            attempts: 0,
            last_accessed: now,
        }
    }

    /// Record one submitted attempt: bump `attempts`, overwrite score and
    /// completion, stamp the access time. Scores above 100 are clamped.
    pub(crate) fn record_attempt(&mut self, score: u8, completed: bool, now: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        self.score = score.min(100);
        self.completed = completed;
        self.last_accessed = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn every_attempt_counts_even_restarts() {
        let now = fixed_now();
        let mut record = QuizProgress::first_visit(now);

        record.record_attempt(80, true, now);
        record.record_attempt(0, false, now);

        assert_eq!(record.attempts, 2);
        assert_eq!(record.score, 0);
        assert!(!record.completed);
    }

    #[test]
    fn scores_are_clamped_to_percent_range() {
        let now = fixed_now();
        let mut record = QuizProgress::first_visit(now);

        record.record_attempt(250, true, now);

        assert_eq!(record.score, 100);
    }
}
