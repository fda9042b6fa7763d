use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ChapterId, ChapterProgress, QuizId, QuizProgress};

/// Progress within one subject: chapter records, quiz records and the
/// cached completion percentage.
///
/// `overall_progress` is derived state. It is recomputed by the owning
/// [`UserProgress`](crate::model::UserProgress) after every mutation that
/// touches this subject and is never written from anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    chapters_progress: BTreeMap<ChapterId, ChapterProgress>,
    quizzes_progress: BTreeMap<QuizId, QuizProgress>,
    overall_progress: u8,
}

/// Zero-progress placeholder returned for subjects a caller asks about
/// before anything was recorded.
pub(crate) static EMPTY_SUBJECT: SubjectProgress = SubjectProgress {
    chapters_progress: BTreeMap::new(),
    quizzes_progress: BTreeMap::new(),
    overall_progress: 0,
};

impl SubjectProgress {
    #[must_use]
    pub fn chapters(&self) -> &BTreeMap<ChapterId, ChapterProgress> {
        &self.chapters_progress
    }

    #[must_use]
    pub fn quizzes(&self) -> &BTreeMap<QuizId, QuizProgress> {
        &self.quizzes_progress
    }

    /// Cached completion percentage, 0–100.
    #[must_use]
    pub fn overall_progress(&self) -> u8 {
        self.overall_progress
    }

    #[must_use]
    pub fn chapter(&self, id: &ChapterId) -> Option<&ChapterProgress> {
        self.chapters_progress.get(id)
    }

    #[must_use]
    pub fn quiz(&self, id: &QuizId) -> Option<&QuizProgress> {
        self.quizzes_progress.get(id)
    }

    /// Seconds spent across every chapter of this subject.
    #[must_use]
    pub fn time_spent(&self) -> u64 {
        self.chapters_progress.values().map(|c| c.time_spent).sum()
    }

    pub(crate) fn chapter_mut_or_insert(
        &mut self,
        id: &ChapterId,
        now: DateTime<Utc>,
    ) -> &mut ChapterProgress {
        self.chapters_progress
            .entry(id.clone())
            .or_insert_with(|| ChapterProgress::first_visit(now))
    }

    pub(crate) fn quiz_mut_or_insert(
        &mut self,
        id: &QuizId,
        now: DateTime<Utc>,
    ) -> &mut QuizProgress {
        self.quizzes_progress
            .entry(id.clone())
            .or_insert_with(|| QuizProgress::first_visit(now))
    }

    /// Recompute the cached percentage from the completion ratios.
    ///
    /// Chapters and quizzes weigh equally when both sets are non-empty;
    /// otherwise the non-empty set decides alone, and an untouched subject
    /// sits at 0. Marking one more record completed can only raise the
    /// result, unmarking can only lower it.
    pub(crate) fn recompute_overall(&mut self) {
        let chapters = completion_percent(
            self.chapters_progress.values().filter(|c| c.completed).count(),
            self.chapters_progress.len(),
        );
        let quizzes = completion_percent(
            self.quizzes_progress.values().filter(|q| q.completed).count(),
            self.quizzes_progress.len(),
        );

        self.overall_progress = match (chapters, quizzes) {
            (Some(c), Some(q)) => mean_percent(c, q),
            (Some(c), None) => c,
            (None, Some(q)) => q,
            (None, None) => 0,
        };
    }
}

fn completion_percent(completed: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = (completed as f64 / total as f64) * 100.0;
    Some(percent.round() as u8)
}

fn mean_percent(a: u8, b: u8) -> u8 {
    ((f64::from(a) + f64::from(b)) / 2.0).round() as u8
}
