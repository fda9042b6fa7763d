use revise_core::model::{SubjectId, SubjectProgress};

/// Presentation-agnostic dashboard row for one subject.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no localization assumptions
///
/// The UI may render times and ratios (e.g. `format_duration`, locale)
/// as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectOverview {
    pub subject: SubjectId,
    pub overall_progress: u8,
    pub time_spent: u64,

    pub chapters_completed: usize,
    pub chapters_total: usize,
    pub quizzes_completed: usize,
    pub quizzes_total: usize,
}

impl SubjectOverview {
    #[must_use]
    pub fn from_subject(subject: SubjectId, progress: &SubjectProgress) -> Self {
        Self {
            subject,
            overall_progress: progress.overall_progress(),
            time_spent: progress.time_spent(),
            chapters_completed: progress.chapters().values().filter(|c| c.completed).count(),
            chapters_total: progress.chapters().len(),
            quizzes_completed: progress.quizzes().values().filter(|q| q.completed).count(),
            quizzes_total: progress.quizzes().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::model::{ChapterId, ChapterPatch, QuizId, UserProgress};
    use revise_core::time::fixed_now;

    #[test]
    fn overview_counts_completions_per_kind() {
        let now = fixed_now();
        let mut progress = UserProgress::bootstrap();
        progress.apply_chapter_patch(
            SubjectId::Economie,
            &ChapterId::new("a"),
            ChapterPatch::new().with_completed(true).with_time_spent(60),
            now,
        );
        progress.apply_chapter_patch(
            SubjectId::Economie,
            &ChapterId::new("b"),
            ChapterPatch::new().with_time_spent(30),
            now,
        );
        progress.record_quiz_attempt(SubjectId::Economie, &QuizId::new("q"), 90, true, now);

        let row = SubjectOverview::from_subject(
            SubjectId::Economie,
            progress.subject(SubjectId::Economie),
        );

        assert_eq!(row.chapters_completed, 1);
        assert_eq!(row.chapters_total, 2);
        assert_eq!(row.quizzes_completed, 1);
        assert_eq!(row.quizzes_total, 1);
        assert_eq!(row.time_spent, 90);
        // 50% chapters, 100% quizzes.
        assert_eq!(row.overall_progress, 75);
    }
}
