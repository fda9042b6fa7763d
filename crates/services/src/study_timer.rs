use std::sync::Arc;

use revise_core::model::{ChapterId, ChapterPatch, SubjectId};

use crate::progress_service::ProgressService;

/// Accumulates one chapter visit's reading time and folds it into the
/// store exactly once.
///
/// A page owns one timer per visit: `tick()` is driven from whatever
/// periodic source the page uses (typically once per second), and
/// `finish()` runs when the page goes away. The final write carries
/// `baseline + elapsed` — the already-summed total the store contract
/// expects — and an internal latch makes any further `finish` or `tick`
/// a no-op, so a teardown racing its own last tick can neither
/// double-count nor drop the tail seconds.
pub struct ChapterTimer {
    service: Arc<ProgressService>,
    subject: SubjectId,
    chapter: ChapterId,
    baseline: u64,
    elapsed: u64,
    finished: bool,
}

impl ChapterTimer {
    /// Start timing a chapter visit, snapshotting the stored total.
    #[must_use]
    pub fn start(service: Arc<ProgressService>, subject: SubjectId, chapter: ChapterId) -> Self {
        let baseline = service
            .chapter_progress(subject, &chapter)
            .map_or(0, |record| record.time_spent);
        Self {
            service,
            subject,
            chapter,
            baseline,
            elapsed: 0,
            finished: false,
        }
    }

    /// Count one elapsed second. Ignored once the timer has finished.
    pub fn tick(&mut self) {
        if !self.finished {
            self.elapsed += 1;
        }
    }

    /// Seconds accumulated by this visit so far.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cancel the timer and flush the accumulated time into the store.
    pub async fn finish(&mut self) {
        self.flush(None).await;
    }

    /// Like [`finish`](Self::finish), but folds the completion toggle
    /// into the same final write.
    pub async fn finish_completed(&mut self, completed: bool) {
        self.flush(Some(completed)).await;
    }

    async fn flush(&mut self, completed: Option<bool>) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut patch = ChapterPatch::new().with_time_spent(self.baseline + self.elapsed);
        if let Some(completed) = completed {
            patch = patch.with_completed(completed);
        }
        self.service
            .update_chapter_progress(self.subject, &self.chapter, patch)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revise_core::time::fixed_clock;

    async fn service() -> Arc<ProgressService> {
        let service = Arc::new(ProgressService::in_memory(fixed_clock()));
        service.init().await;
        service
    }

    #[tokio::test]
    async fn folds_elapsed_time_on_top_of_the_stored_baseline() {
        let service = service().await;
        let chapter = ChapterId::new("marche-prix");
        service
            .update_chapter_progress(
                SubjectId::Economie,
                &chapter,
                ChapterPatch::new().with_time_spent(100),
            )
            .await;

        let mut timer = ChapterTimer::start(Arc::clone(&service), SubjectId::Economie, chapter.clone());
        for _ in 0..30 {
            timer.tick();
        }
        timer.finish().await;

        let record = service
            .chapter_progress(SubjectId::Economie, &chapter)
            .unwrap();
        assert_eq!(record.time_spent, 130);
        assert_eq!(service.total_time_spent(), 130);
    }

    #[tokio::test]
    async fn finish_is_exactly_once() {
        let service = service().await;
        let chapter = ChapterId::new("socialisation");

        let mut timer =
            ChapterTimer::start(Arc::clone(&service), SubjectId::Sociologie, chapter.clone());
        timer.tick();
        timer.tick();
        timer.finish().await;

        // A second teardown and a late tick change nothing.
        timer.tick();
        timer.finish().await;

        let record = service
            .chapter_progress(SubjectId::Sociologie, &chapter)
            .unwrap();
        assert_eq!(record.time_spent, 2);
        assert!(timer.is_finished());
    }

    #[tokio::test]
    async fn finish_completed_flushes_time_and_toggle_together() {
        let service = service().await;
        let chapter = ChapterId::new("etat-droit");

        let mut timer =
            ChapterTimer::start(Arc::clone(&service), SubjectId::SciencePolitique, chapter.clone());
        timer.tick();
        timer.finish_completed(true).await;

        let record = service
            .chapter_progress(SubjectId::SciencePolitique, &chapter)
            .unwrap();
        assert!(record.completed);
        assert_eq!(record.time_spent, 1);
    }

    #[tokio::test]
    async fn unstarted_visit_flushes_zero_seconds_without_losing_the_record() {
        let service = service().await;
        let chapter = ChapterId::new("jamais-lu");

        let mut timer =
            ChapterTimer::start(Arc::clone(&service), SubjectId::Economie, chapter.clone());
        timer.finish().await;

        let record = service
            .chapter_progress(SubjectId::Economie, &chapter)
            .unwrap();
        assert_eq!(record.time_spent, 0);
    }

    #[tokio::test]
    async fn two_timers_on_different_chapters_keep_the_sum_exact() {
        let service = service().await;
        let first = ChapterId::new("ch-a");
        let second = ChapterId::new("ch-b");

        let mut timer_a =
            ChapterTimer::start(Arc::clone(&service), SubjectId::Economie, first.clone());
        let mut timer_b =
            ChapterTimer::start(Arc::clone(&service), SubjectId::Sociologie, second.clone());

        for _ in 0..10 {
            timer_a.tick();
        }
        for _ in 0..5 {
            timer_b.tick();
        }

        // Both pages tear down in the same instant; each patch only names
        // its own chapter, so the recomputed sum is exact.
        timer_a.finish().await;
        timer_b.finish().await;

        assert_eq!(service.total_time_spent(), 15);
    }
}
