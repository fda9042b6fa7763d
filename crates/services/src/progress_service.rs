use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::warn;

use revise_core::model::{
    ActivityEntry, ChapterId, ChapterPatch, ChapterProgress, QuizId, QuizProgress, SubjectId,
    UserProgress,
};
use storage::repository::{InMemoryRepository, ProgressRepository};

use crate::Clock;
use crate::view::SubjectOverview;

/// The shared progress store.
///
/// One instance per session, handed to every consumer as
/// `Arc<ProgressService>`. The in-memory document is authoritative:
/// mutations are applied in call order under one lock, so a read issued
/// after a write observes it no matter how persistence fares. Every
/// mutating call writes the full document through to the slot; a failed
/// write downgrades to a warning and the session keeps serving from
/// memory.
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    state: Mutex<UserProgress>,
    loaded: AtomicBool,
    save_gate: tokio::sync::Mutex<()>,
}

impl ProgressService {
    /// Create a store over the given slot, starting from the bootstrap
    /// default until [`init`](Self::init) has run.
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            clock,
            repo,
            state: Mutex::new(UserProgress::bootstrap()),
            loaded: AtomicBool::new(false),
            save_gate: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, Arc::new(InMemoryRepository::new()))
    }

    /// One-shot load of the stored document.
    ///
    /// Absent, corrupt or unreadable slots all resolve to the bootstrap
    /// default; no failure reaches the caller. Repeated calls are no-ops.
    pub async fn init(&self) {
        if self.loaded.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.repo.load().await {
            Ok(Some(document)) => *self.state() = document,
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "could not load stored progress, starting from the bootstrap default");
            }
        }
    }

    /// True until the initial load has resolved.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.loaded.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ─── Reads ─────────────────────────────────────────────────────────────────

    /// Snapshot of one chapter record; `None` if never visited.
    #[must_use]
    pub fn chapter_progress(&self, subject: SubjectId, chapter: &ChapterId) -> Option<ChapterProgress> {
        self.state().chapter(subject, chapter).cloned()
    }

    /// Snapshot of one quiz record; `None` if never attempted.
    #[must_use]
    pub fn quiz_progress(&self, subject: SubjectId, quiz: &QuizId) -> Option<QuizProgress> {
        self.state().quiz(subject, quiz).cloned()
    }

    /// Global percentage across the three subjects, 0–100.
    #[must_use]
    pub fn overall_progress(&self) -> u8 {
        self.state().overall_progress()
    }

    /// Cached percentage for one subject, 0–100.
    #[must_use]
    pub fn subject_overall(&self, subject: SubjectId) -> u8 {
        self.state().subject(subject).overall_progress()
    }

    /// Seconds spent across every chapter of every subject.
    #[must_use]
    pub fn total_time_spent(&self) -> u64 {
        self.state().total_time_spent()
    }

    /// Newest-first merged feed of chapter and quiz records.
    #[must_use]
    pub fn recent_activities(&self, limit: usize) -> Vec<ActivityEntry> {
        self.state().recent_activities(limit)
    }

    /// Dashboard rows for all three subjects, in canonical order.
    #[must_use]
    pub fn subject_overviews(&self) -> Vec<SubjectOverview> {
        let state = self.state();
        SubjectId::ALL
            .iter()
            .map(|subject| SubjectOverview::from_subject(*subject, state.subject(*subject)))
            .collect()
    }

    /// Full snapshot of the current document.
    #[must_use]
    pub fn snapshot(&self) -> UserProgress {
        self.state().clone()
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Merge a chapter patch and persist.
    ///
    /// Creates the record on first reference and overwrites only the
    /// provided fields; `time_spent` carries the caller's already-summed
    /// total. Applying the same patch twice yields the same state apart
    /// from `last_accessed`. Never fails from the caller's point of view.
    pub async fn update_chapter_progress(
        &self,
        subject: SubjectId,
        chapter: &ChapterId,
        patch: ChapterPatch,
    ) {
        let now = self.clock.now();
        self.state().apply_chapter_patch(subject, chapter, patch, now);
        self.persist().await;
    }

    /// Record a submitted quiz attempt and persist.
    ///
    /// Always counts one more attempt; score and completion are
    /// last-write-wins, so a restart submitted as `(0, false)` resets both
    /// while the attempt still counts.
    pub async fn update_quiz_progress(
        &self,
        subject: SubjectId,
        quiz: &QuizId,
        score: u8,
        completed: bool,
    ) {
        let now = self.clock.now();
        self.state()
            .record_quiz_attempt(subject, quiz, score, completed, now);
        self.persist().await;
    }

    /// Full reset: clear the durable slot and restore the bootstrap
    /// default in memory.
    pub async fn reset(&self) {
        *self.state() = UserProgress::bootstrap();
        if let Err(err) = self.repo.clear().await {
            warn!(error = %err, "could not clear stored progress");
        }
    }

    fn state(&self) -> MutexGuard<'_, UserProgress> {
        // A poisoned lock still holds a consistent document; take it back.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn persist(&self) {
        // Writers queue on the gate and each snapshots the latest
        // document once inside, so overlapping saves can only move the
        // slot forward.
        let _gate = self.save_gate.lock().await;
        let snapshot = self.state().clone();
        if let Err(err) = self.repo.save(&snapshot).await {
            warn!(error = %err, "could not persist progress, keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::time::fixed_clock;

    #[tokio::test]
    async fn starts_loading_until_init_resolves() {
        let service = ProgressService::in_memory(fixed_clock());
        assert!(service.is_loading());

        service.init().await;
        assert!(!service.is_loading());
    }

    #[tokio::test]
    async fn writes_are_visible_to_reads_immediately() {
        let service = ProgressService::in_memory(fixed_clock());
        service.init().await;
        let chapter = ChapterId::new("marche-prix");

        service
            .update_chapter_progress(
                SubjectId::Economie,
                &chapter,
                ChapterPatch::new().with_time_spent(42),
            )
            .await;

        let record = service
            .chapter_progress(SubjectId::Economie, &chapter)
            .expect("record created");
        assert_eq!(record.time_spent, 42);
        assert!(!record.completed);
        assert_eq!(record.last_accessed, service.now());
        assert_eq!(service.total_time_spent(), 42);
    }

    #[tokio::test]
    async fn corrupt_slot_falls_back_to_bootstrap() {
        let repo = Arc::new(InMemoryRepository::with_raw_document("** not a document **"));
        let service = ProgressService::new(fixed_clock(), repo);

        service.init().await;

        assert!(!service.is_loading());
        assert_eq!(service.snapshot(), UserProgress::bootstrap());
    }

    #[tokio::test]
    async fn corrupt_slot_and_empty_slot_bootstrap_identically() {
        let from_corrupt = ProgressService::new(
            fixed_clock(),
            Arc::new(InMemoryRepository::with_raw_document("{broken")),
        );
        from_corrupt.init().await;

        let from_empty = ProgressService::in_memory(fixed_clock());
        from_empty.init().await;

        assert_eq!(from_corrupt.snapshot(), from_empty.snapshot());
    }

    #[tokio::test]
    async fn init_does_not_reload_twice() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(fixed_clock(), Arc::clone(&repo) as Arc<dyn ProgressRepository>);
        service.init().await;

        service
            .update_quiz_progress(SubjectId::Economie, &QuizId::new("concurrence"), 80, true)
            .await;

        // A stray second init must not clobber the session's state with
        // the older stored document.
        service.init().await;
        let record = service
            .quiz_progress(SubjectId::Economie, &QuizId::new("concurrence"))
            .expect("record kept");
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn reset_restores_bootstrap_and_clears_the_slot() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(fixed_clock(), Arc::clone(&repo) as Arc<dyn ProgressRepository>);
        service.init().await;

        service
            .update_chapter_progress(
                SubjectId::Sociologie,
                &ChapterId::new("socialisation"),
                ChapterPatch::new().with_time_spent(10),
            )
            .await;
        assert!(repo.raw_document().is_some());

        service.reset().await;

        assert_eq!(service.snapshot(), UserProgress::bootstrap());
        assert!(repo.raw_document().is_none());
    }

    #[tokio::test]
    async fn mutations_write_through_to_the_slot() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(fixed_clock(), Arc::clone(&repo) as Arc<dyn ProgressRepository>);
        service.init().await;

        service
            .update_quiz_progress(SubjectId::Economie, &QuizId::new("concurrence"), 70, true)
            .await;

        let stored = repo.load().await.unwrap().expect("document persisted");
        assert_eq!(stored, service.snapshot());
    }
}
