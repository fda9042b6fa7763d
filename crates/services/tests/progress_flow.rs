use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use revise_core::model::{ChapterId, ChapterPatch, QuizId, SubjectId, UserProgress};
use revise_core::time::fixed_clock;
use services::{ChapterTimer, ProgressService};
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};

/// Slot whose writes can be switched off, standing in for a full or
/// disabled storage backend.
#[derive(Clone, Default)]
struct FlakySlot {
    inner: InMemoryRepository,
    fail_writes: Arc<AtomicBool>,
}

impl FlakySlot {
    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProgressRepository for FlakySlot {
    async fn load(&self) -> Result<Option<UserProgress>, StorageError> {
        self.inner.load().await
    }

    async fn save(&self, progress: &UserProgress) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("quota exceeded".into()));
        }
        self.inner.save(progress).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.inner.clear().await
    }
}

#[tokio::test]
async fn full_revision_session_round_trips_through_one_store() {
    let repo = InMemoryRepository::new();
    let service = Arc::new(ProgressService::new(
        fixed_clock(),
        Arc::new(repo.clone()),
    ));
    service.init().await;

    // A chapter page reads, studies, then folds its session time in.
    let chapter = ChapterId::new("marche-prix");
    let mut timer = ChapterTimer::start(Arc::clone(&service), SubjectId::Economie, chapter.clone());
    for _ in 0..42 {
        timer.tick();
    }
    timer.finish_completed(true).await;

    // A quiz page submits a completed attempt, then a restart.
    let quiz = QuizId::new("concurrence");
    service
        .update_quiz_progress(SubjectId::Economie, &quiz, 80, true)
        .await;
    service
        .update_quiz_progress(SubjectId::Economie, &quiz, 0, false)
        .await;

    let quiz_record = service.quiz_progress(SubjectId::Economie, &quiz).unwrap();
    assert_eq!(quiz_record.attempts, 2);
    assert_eq!(quiz_record.score, 0);
    assert!(!quiz_record.completed);

    assert_eq!(service.total_time_spent(), 42);

    // A second session over the same slot sees everything.
    let next_session = ProgressService::new(fixed_clock(), Arc::new(repo));
    next_session.init().await;
    assert_eq!(next_session.snapshot(), service.snapshot());
    assert_eq!(
        next_session
            .chapter_progress(SubjectId::Economie, &chapter)
            .unwrap()
            .time_spent,
        42
    );
}

#[tokio::test]
async fn failed_writes_never_reach_callers_and_memory_stays_authoritative() {
    let slot = FlakySlot::default();
    let service = ProgressService::new(fixed_clock(), Arc::new(slot.clone()));
    service.init().await;

    slot.fail_writes(true);
    service
        .update_chapter_progress(
            SubjectId::Sociologie,
            &ChapterId::new("socialisation"),
            ChapterPatch::new().with_time_spent(30),
        )
        .await;

    // The slot kept nothing, the session serves the write regardless.
    assert!(slot.inner.raw_document().is_none());
    assert_eq!(service.total_time_spent(), 30);

    // Once storage recovers, the next write lands the whole document.
    slot.fail_writes(false);
    service
        .update_quiz_progress(SubjectId::Sociologie, &QuizId::new("q"), 100, true)
        .await;

    let stored = slot.inner.load().await.unwrap().expect("document persisted");
    assert_eq!(stored, service.snapshot());
    assert_eq!(stored.total_time_spent(), 30);
}

#[tokio::test]
async fn many_handles_share_one_logical_store() {
    let service = Arc::new(ProgressService::in_memory(fixed_clock()));
    service.init().await;

    let sidebar = Arc::clone(&service);
    let page = Arc::clone(&service);

    page.update_chapter_progress(
        SubjectId::SciencePolitique,
        &ChapterId::new("etat-droit"),
        ChapterPatch::new().with_completed(true),
    )
    .await;

    assert_eq!(sidebar.subject_overall(SubjectId::SciencePolitique), 100);
    assert_eq!(sidebar.overall_progress(), 33);

    let feed = sidebar.recent_activities(5);
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, "etat-droit");
}
