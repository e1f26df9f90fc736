use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when decoding badges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BadgeError {
    #[error("unknown badge: {0}")]
    Unknown(String),
}

//
// ─── BADGE ────────────────────────────────────────────────────────────────────
//

/// One-time achievement markers tied to lesson completions.
///
/// Each badge is awarded at most once per learner profile. The variants
/// double as the canonical priority order for awarding: when a completion
/// satisfies several rules at once, only the highest-priority unheld badge
/// is granted for that completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Badge {
    /// Completed the first lesson.
    FirstLesson,
    /// Completed three lessons.
    ThreeLessons,
    /// Completed five lessons.
    FiveLessons,
    /// Completed every lesson in the catalog.
    AllLessons,
    /// Scored 100 or more on a single lesson.
    PerfectScore,
}

impl Badge {
    /// All badges in award-priority order.
    pub const ALL: [Badge; 5] = [
        Badge::FirstLesson,
        Badge::ThreeLessons,
        Badge::FiveLessons,
        Badge::AllLessons,
        Badge::PerfectScore,
    ];

    /// Stable string form, used as the storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::FirstLesson => "first-lesson",
            Badge::ThreeLessons => "three-lessons",
            Badge::FiveLessons => "five-lessons",
            Badge::AllLessons => "all-lessons",
            Badge::PerfectScore => "perfect-score",
        }
    }

    /// Decodes the stable string form.
    ///
    /// # Errors
    ///
    /// Returns `BadgeError::Unknown` for unrecognised keys.
    pub fn from_key(key: &str) -> Result<Self, BadgeError> {
        match key {
            "first-lesson" => Ok(Badge::FirstLesson),
            "three-lessons" => Ok(Badge::ThreeLessons),
            "five-lessons" => Ok(Badge::FiveLessons),
            "all-lessons" => Ok(Badge::AllLessons),
            "perfect-score" => Ok(Badge::PerfectScore),
            other => Err(BadgeError::Unknown(other.to_string())),
        }
    }

    /// Human-readable title shown to learners.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Badge::FirstLesson => "First Steps",
            Badge::ThreeLessons => "Getting Serious",
            Badge::FiveLessons => "Halfway Hero",
            Badge::AllLessons => "AI Literate",
            Badge::PerfectScore => "Perfectionist",
        }
    }

    /// Whether this badge's rule is satisfied for a completion.
    ///
    /// `completed` is the lesson count *including* the completion being
    /// processed, `score` the score submitted with it, and `catalog_size`
    /// the number of lessons in the catalog.
    #[must_use]
    pub fn unlocked(self, completed: usize, score: i32, catalog_size: u32) -> bool {
        match self {
            Badge::FirstLesson => completed >= 1,
            Badge::ThreeLessons => completed >= 3,
            Badge::FiveLessons => completed >= 5,
            Badge::AllLessons => completed >= catalog_size as usize,
            Badge::PerfectScore => score >= 100,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
