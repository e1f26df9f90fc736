use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::badge::Badge;
use crate::model::ids::LessonId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("total points ({total}) do not match completion count ({count})")]
    PointsMismatch { total: u32, count: usize },

    #[error("duplicate lesson in persisted progress: {0}")]
    DuplicateLesson(LessonId),
}

//
// ─── COMPLETED LESSON ─────────────────────────────────────────────────────────
//

/// Points granted for every lesson completion.
pub const POINTS_PER_LESSON: u32 = 100;

/// Number of lessons in the current catalog.
///
/// Content, not code: `LearnerProgress` takes the size as a parameter and
/// only falls back to this when callers don't care.
pub const DEFAULT_CATALOG_SIZE: u32 = 11;

/// Record of a single lesson completion.
///
/// Scores are stored exactly as submitted; the platform does not clamp or
/// validate them beyond being an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedLesson {
    pub lesson_id: LessonId,
    pub title: String,
    pub completed_at: DateTime<Utc>,
    pub score: i32,
    pub points_earned: u32,
}

/// What a single `record_completion` call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Points granted by this call; zero for duplicate submissions.
    pub points_earned: u32,
    /// At most one badge is granted per completion.
    pub new_badge: Option<Badge>,
}

impl CompletionOutcome {
    /// Outcome for a re-submitted lesson: nothing changes.
    #[must_use]
    pub fn no_op() -> Self {
        Self {
            points_earned: 0,
            new_badge: None,
        }
    }
}

//
// ─── LEARNER PROGRESS ─────────────────────────────────────────────────────────
//

/// Durable point/badge state for a single learner profile.
///
/// Completions are append-only and deduplicated by lesson id, so
/// `total_points == POINTS_PER_LESSON * completed.len()` holds at all
/// times. Badges keep their award order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProgress {
    total_points: u32,
    badges: Vec<Badge>,
    completed: Vec<CompletedLesson>,
    catalog_size: u32,
}

impl Default for LearnerProgress {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_SIZE)
    }
}

impl LearnerProgress {
    /// Fresh progress for a profile, against a catalog of `catalog_size`
    /// lessons.
    #[must_use]
    pub fn new(catalog_size: u32) -> Self {
        Self {
            total_points: 0,
            badges: Vec::new(),
            completed: Vec::new(),
            catalog_size,
        }
    }

    /// Rehydrate progress from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::DuplicateLesson` if the same lesson appears
    /// twice, or `ProgressError::PointsMismatch` if the stored total does
    /// not equal 100 points per completion.
    pub fn from_persisted(
        total_points: u32,
        badges: Vec<Badge>,
        completed: Vec<CompletedLesson>,
        catalog_size: u32,
    ) -> Result<Self, ProgressError> {
        for (i, lesson) in completed.iter().enumerate() {
            if completed[..i].iter().any(|c| c.lesson_id == lesson.lesson_id) {
                return Err(ProgressError::DuplicateLesson(lesson.lesson_id.clone()));
            }
        }

        let expected = POINTS_PER_LESSON
            .checked_mul(u32::try_from(completed.len()).unwrap_or(u32::MAX))
            .unwrap_or(u32::MAX);
        if total_points != expected {
            return Err(ProgressError::PointsMismatch {
                total: total_points,
                count: completed.len(),
            });
        }

        let mut progress = Self {
            total_points,
            badges: Vec::new(),
            completed,
            catalog_size,
        };
        for badge in badges {
            if !progress.has_badge(badge) {
                progress.badges.push(badge);
            }
        }
        Ok(progress)
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    #[must_use]
    pub fn completed(&self) -> &[CompletedLesson] {
        &self.completed
    }

    #[must_use]
    pub fn catalog_size(&self) -> u32 {
        self.catalog_size
    }

    #[must_use]
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed.iter().any(|c| &c.lesson_id == lesson_id)
    }

    /// Record a lesson completion and award points and at most one badge.
    ///
    /// Re-submitting an already-completed lesson is a no-op that earns
    /// zero points and leaves the ledger untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyTitle` if the display title is blank.
    pub fn record_completion(
        &mut self,
        lesson_id: LessonId,
        title: impl Into<String>,
        score: i32,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, ProgressError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ProgressError::EmptyTitle);
        }

        if self.is_completed(&lesson_id) {
            return Ok(CompletionOutcome::no_op());
        }

        self.completed.push(CompletedLesson {
            lesson_id,
            title,
            completed_at: now,
            score,
            points_earned: POINTS_PER_LESSON,
        });
        self.total_points += POINTS_PER_LESSON;

        let new_badge = self.next_badge(score);
        if let Some(badge) = new_badge {
            self.badges.push(badge);
        }

        Ok(CompletionOutcome {
            points_earned: POINTS_PER_LESSON,
            new_badge,
        })
    }

    /// First badge in priority order that is unlocked and not yet held.
    fn next_badge(&self, score: i32) -> Option<Badge> {
        let count = self.completed.len();
        Badge::ALL
            .into_iter()
            .find(|badge| !self.has_badge(*badge) && badge.unlocked(count, score, self.catalog_size))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
