use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when decoding activity kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivityError {
    #[error("unknown activity kind: {0}")]
    UnknownKind(String),
}

//
// ─── ACTIVITY KIND ────────────────────────────────────────────────────────────
//

/// The interaction types the platform counts.
///
/// Closed set on purpose: unknown client event names are rejected at the
/// edge instead of minting unbounded counter rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PageView,
    LessonStart,
    LessonComplete,
    QuizAttempt,
    ChatMessage,
    AssetDownload,
}

impl ActivityKind {
    /// Stable string form, used as the storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::PageView => "page_view",
            ActivityKind::LessonStart => "lesson_start",
            ActivityKind::LessonComplete => "lesson_complete",
            ActivityKind::QuizAttempt => "quiz_attempt",
            ActivityKind::ChatMessage => "chat_message",
            ActivityKind::AssetDownload => "asset_download",
        }
    }

    /// Decodes the stable string form.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::UnknownKind` for unrecognised keys.
    pub fn from_key(key: &str) -> Result<Self, ActivityError> {
        match key {
            "page_view" => Ok(ActivityKind::PageView),
            "lesson_start" => Ok(ActivityKind::LessonStart),
            "lesson_complete" => Ok(ActivityKind::LessonComplete),
            "quiz_attempt" => Ok(ActivityKind::QuizAttempt),
            "chat_message" => Ok(ActivityKind::ChatMessage),
            "asset_download" => Ok(ActivityKind::AssetDownload),
            other => Err(ActivityError::UnknownKind(other.to_string())),
        }
    }
}

//
// ─── EVENTS AND BUCKETS ───────────────────────────────────────────────────────
//

/// A single client interaction event.
///
/// Deliberately minimal: no session id, no payload. Event identity is
/// discarded once the event lands in a daily bucket, which bounds storage
/// growth at the cost of ever reconstructing an individual session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    #[must_use]
    pub fn new(kind: ActivityKind, occurred_at: DateTime<Utc>) -> Self {
        Self { kind, occurred_at }
    }
}

/// Dimension an aggregate counter is keyed by: UTC day and event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub day: NaiveDate,
    pub kind: ActivityKind,
}

impl BucketKey {
    #[must_use]
    pub fn new(day: NaiveDate, kind: ActivityKind) -> Self {
        Self { day, kind }
    }

    /// The bucket an event falls into (UTC calendar day).
    #[must_use]
    pub fn for_event(event: &ActivityEvent) -> Self {
        Self {
            day: event.occurred_at.date_naive(),
            kind: event.kind,
        }
    }
}

/// Groups events into `(day, kind)` buckets with occurrence counts.
///
/// The map is ordered, so callers that iterate it write counters in a
/// deterministic sequence.
#[must_use]
pub fn bucket_events(events: &[ActivityEvent]) -> BTreeMap<BucketKey, u64> {
    let mut buckets = BTreeMap::new();
    for event in events {
        *buckets.entry(BucketKey::for_event(event)).or_insert(0) += 1;
    }
    buckets
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
