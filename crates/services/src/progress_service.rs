use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use ora_core::Clock;
use ora_core::model::{Badge, LearnerProgress, LessonId, ProfileId};
use storage::repository::ProgressRepository;

use crate::metrics::TelemetrySink;

//
// ─── COMPLETION RECEIPT ───────────────────────────────────────────────────────
//

/// What the caller gets back for a completion submission.
///
/// Zero points means the lesson was already completed (or the submission
/// was invalid); the caller cannot tell whether the write behind a
/// non-zero receipt actually stuck. Delivery is explicitly best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReceipt {
    pub points_earned: u32,
    pub new_badge: Option<Badge>,
    pub total_points: u32,
}

impl CompletionReceipt {
    fn rejected() -> Self {
        Self {
            points_earned: 0,
            new_badge: None,
            total_points: 0,
        }
    }
}

//
// ─── PROGRESS SERVICE ─────────────────────────────────────────────────────────
//

/// Converts lesson completions into durable point/badge state.
///
/// Follows the platform's never-break-the-learner policy: every failure
/// path degrades to a harmless default and is reported on the telemetry
/// sink rather than returned. Gamification is a flourish, not a ledger of
/// record.
pub struct ProgressService {
    clock: Clock,
    catalog_size: u32,
    repo: Arc<dyn ProgressRepository>,
    sink: Arc<dyn TelemetrySink>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog_size: u32,
        repo: Arc<dyn ProgressRepository>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            clock,
            catalog_size,
            repo,
            sink,
        }
    }

    #[must_use]
    pub fn catalog_size(&self) -> u32 {
        self.catalog_size
    }

    /// Record a lesson completion for a profile.
    ///
    /// Duplicate submissions earn zero points and change nothing. Storage
    /// failures on load fall back to fresh state; failures on save are
    /// swallowed after the receipt is computed, so the receipt can claim
    /// points that were never persisted.
    pub async fn record_completion(
        &self,
        profile: &ProfileId,
        lesson_id: LessonId,
        title: &str,
        score: i32,
    ) -> CompletionReceipt {
        let mut progress = self.load_or_fresh(profile).await;

        let outcome =
            match progress.record_completion(lesson_id, title, score, self.clock.now()) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(%profile, %error, "completion rejected");
                    self.sink.completion_rejected();
                    return CompletionReceipt::rejected();
                }
            };

        if outcome.points_earned > 0 {
            if let Err(error) = self.repo.save_progress(profile, &progress).await {
                warn!(%profile, %error, "progress save failed; receipt still issued");
                self.sink.progress_save_failed();
            }
        }

        CompletionReceipt {
            points_earned: outcome.points_earned,
            new_badge: outcome.new_badge,
            total_points: progress.total_points(),
        }
    }

    /// Current progress snapshot for a profile; empty on any failure.
    pub async fn progress(&self, profile: &ProfileId) -> LearnerProgress {
        self.load_or_fresh(profile).await
    }

    async fn load_or_fresh(&self, profile: &ProfileId) -> LearnerProgress {
        match self.repo.load_progress(profile, self.catalog_size).await {
            Ok(Some(progress)) => progress,
            Ok(None) => LearnerProgress::new(self.catalog_size),
            Err(error) => {
                // Malformed or unreadable state is treated as no prior
                // progress, same as the original client-side ledger.
                warn!(%profile, %error, "progress load failed; starting fresh");
                self.sink.progress_load_reset();
                LearnerProgress::new(self.catalog_size)
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
