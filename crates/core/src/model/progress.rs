use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    ActivityEntry, ActivityKind, ChapterId, ChapterPatch, ChapterProgress, QuizId, QuizProgress,
    SubjectId, SubjectProgress,
};

/// Root progress record: one instance per user and device.
///
/// All mutation goes through the methods here, so the derived fields
/// (`total_time_spent` and each subject's cached percentage) can never
/// drift from the leaf records. `total_time_spent` is recomputed from the
/// full record set on every chapter write rather than trusted from a
/// caller, which is what makes same-tick flushes from two different
/// chapter pages safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    subjects: BTreeMap<SubjectId, SubjectProgress>,
    total_time_spent: u64,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::bootstrap()
    }
}

impl UserProgress {
    /// Canonical empty record: all three subjects present, zero totals.
    #[must_use]
    pub fn bootstrap() -> Self {
        let mut subjects = BTreeMap::new();
        for subject in SubjectId::ALL {
            subjects.insert(subject, SubjectProgress::default());
        }
        Self {
            subjects,
            total_time_spent: 0,
        }
    }

    /// Re-establish derived state on a freshly decoded document.
    ///
    /// Missing subject keys are re-seeded and every derived field is
    /// recomputed, so a partial or hand-edited document cannot carry a
    /// stale percentage or a total that disagrees with its chapters.
    pub fn restore_invariants(&mut self) {
        for subject in SubjectId::ALL {
            self.subjects.entry(subject).or_default();
        }
        for progress in self.subjects.values_mut() {
            progress.recompute_overall();
        }
        self.total_time_spent = self.sum_time_spent();
    }

    // ─── Reads ─────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn subject(&self, id: SubjectId) -> &SubjectProgress {
        self.subjects
            .get(&id)
            .unwrap_or(&super::subject::EMPTY_SUBJECT)
    }

    /// Sum of every chapter's `time_spent`, in seconds.
    #[must_use]
    pub fn total_time_spent(&self) -> u64 {
        self.total_time_spent
    }

    /// Pure lookup; `None` means the chapter was never visited.
    #[must_use]
    pub fn chapter(&self, subject: SubjectId, id: &ChapterId) -> Option<&ChapterProgress> {
        self.subjects.get(&subject).and_then(|s| s.chapter(id))
    }

    /// Pure lookup; `None` means the quiz was never attempted.
    #[must_use]
    pub fn quiz(&self, subject: SubjectId, id: &QuizId) -> Option<&QuizProgress> {
        self.subjects.get(&subject).and_then(|s| s.quiz(id))
    }

    /// Global percentage: the three subjects weigh equally.
    #[must_use]
    pub fn overall_progress(&self) -> u8 {
        let total: u32 = SubjectId::ALL
            .iter()
            .map(|s| u32::from(self.subject(*s).overall_progress()))
            .sum();
        (f64::from(total) / SubjectId::ALL.len() as f64).round() as u8
    }

    /// Newest-first feed of every chapter and quiz record, truncated to
    /// `limit`. Equal timestamps fall back to (subject, kind, id) so the
    /// ordering is reproducible.
    #[must_use]
    pub fn recent_activities(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = Vec::new();
        for (subject, progress) in &self.subjects {
            for (id, chapter) in progress.chapters() {
                entries.push(ActivityEntry {
                    id: id.as_str().to_owned(),
                    subject: *subject,
                    kind: ActivityKind::Chapter,
                    timestamp: chapter.last_accessed,
                });
            }
            for (id, quiz) in progress.quizzes() {
                entries.push(ActivityEntry {
                    id: id.as_str().to_owned(),
                    subject: *subject,
                    kind: ActivityKind::Quiz,
                    timestamp: quiz.last_accessed,
                });
            }
        }

        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.subject.cmp(&b.subject))
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.id.cmp(&b.id))
        });
        entries.truncate(limit);
        entries
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Merge a field-wise patch into one chapter record.
    ///
    /// Creates the record on first reference, overwrites only the provided
    /// fields, stamps `last_accessed = now`, then recomputes the global
    /// time total and the owning subject's percentage.
    pub fn apply_chapter_patch(
        &mut self,
        subject: SubjectId,
        chapter: &ChapterId,
        patch: ChapterPatch,
        now: DateTime<Utc>,
    ) {
        let entry = self.subjects.entry(subject).or_default();
        patch.apply(entry.chapter_mut_or_insert(chapter, now), now);
        entry.recompute_overall();
        self.total_time_spent = self.sum_time_spent();
    }

    /// Record one submitted quiz attempt (restarts included).
    ///
    /// Always increments `attempts`; `score` and `completed` are
    /// last-write-wins. Recomputes the owning subject's percentage.
    pub fn record_quiz_attempt(
        &mut self,
        subject: SubjectId,
        quiz: &QuizId,
        score: u8,
        completed: bool,
        now: DateTime<Utc>,
    ) {
        let entry = self.subjects.entry(subject).or_default();
        entry
            .quiz_mut_or_insert(quiz, now)
            .record_attempt(score, completed, now);
        entry.recompute_overall();
    }

    fn sum_time_spent(&self) -> u64 {
        self.subjects.values().map(SubjectProgress::time_spent).sum()
    }
}
