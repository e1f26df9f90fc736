use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use chrono::NaiveDate;
use ora_core::model::{ActivityEvent, ActivityKind, BucketKey, bucket_events};
use ora_core::{BreakerSettings, CircuitBreaker, Clock};
use storage::repository::{ActivityRepository, StorageError};

use crate::metrics::{DropReason, TelemetrySink};

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

/// Tuning for the activity tracker.
///
/// The batch cap and write pause are the platform's blunt protection
/// against a burst of client telemetry overwhelming the backing store;
/// they are deliberate capacity constants, not adaptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Operational kill switch. When false, `ingest` is an unconditional
    /// no-op regardless of breaker state.
    pub enabled: bool,
    /// Events kept per batch; the rest are dropped before grouping.
    pub max_batch: usize,
    /// Pause before every counter write after the first in a batch.
    pub write_pause: Duration,
    /// Circuit breaker thresholds.
    pub breaker: BreakerSettings,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_batch: 5,
            write_pause: Duration::from_secs(1),
            breaker: BreakerSettings::default(),
        }
    }
}

//
// ─── INGEST REPORT ────────────────────────────────────────────────────────────
//

/// How an ingest call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestDisposition {
    /// Every bucket was written.
    Completed,
    /// Tracking is switched off; nothing was read or written.
    Disabled,
    /// The breaker was open; nothing was read or written.
    BreakerOpen,
    /// A write failed and the remaining buckets were abandoned.
    Aborted,
}

/// Summary of one ingest call.
///
/// Informational only: the HTTP layer always reports success to the
/// client, so this is the sole record of what actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Events counted after the batch cap was applied.
    pub accepted: usize,
    /// Events dropped by the batch cap.
    pub truncated: usize,
    /// Buckets whose counters were updated.
    pub written_buckets: usize,
    pub disposition: IngestDisposition,
}

impl IngestReport {
    fn dropped(disposition: IngestDisposition) -> Self {
        Self {
            accepted: 0,
            truncated: 0,
            written_buckets: 0,
            disposition,
        }
    }
}

//
// ─── ACTIVITY TRACKER ─────────────────────────────────────────────────────────
//

/// Batch-ingests client telemetry into daily `(day, kind)` counters.
///
/// Writes go through one read-increment-write cycle per bucket,
/// sequentially, with a fixed pause between writes. Consecutive failures
/// trip the breaker, which then drops whole batches until its cooldown
/// elapses. Concurrent ingests are not coordinated; counters are
/// approximate under concurrent load.
pub struct ActivityTracker {
    config: TrackerConfig,
    clock: Clock,
    repo: Arc<dyn ActivityRepository>,
    breaker: Mutex<CircuitBreaker>,
    sink: Arc<dyn TelemetrySink>,
}

impl ActivityTracker {
    #[must_use]
    pub fn new(
        config: TrackerConfig,
        clock: Clock,
        repo: Arc<dyn ActivityRepository>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let breaker = Mutex::new(CircuitBreaker::new(config.breaker));
        Self {
            config,
            clock,
            repo,
            breaker,
            sink,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Ingest a batch of events. Never fails; the report says what stuck.
    pub async fn ingest(&self, mut events: Vec<ActivityEvent>) -> IngestReport {
        if !self.config.enabled {
            self.sink.batch_dropped(DropReason::Disabled);
            return IngestReport::dropped(IngestDisposition::Disabled);
        }

        if self.breaker_open() {
            debug!(batch = events.len(), "breaker open, dropping batch");
            self.sink.batch_dropped(DropReason::BreakerOpen);
            return IngestReport::dropped(IngestDisposition::BreakerOpen);
        }

        let truncated = events.len().saturating_sub(self.config.max_batch);
        events.truncate(self.config.max_batch);
        let accepted = events.len();

        let buckets = bucket_events(&events);
        let mut written_buckets = 0;

        for (index, (key, increment)) in buckets.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.write_pause).await;
            }

            match self.bump_counter(key, *increment).await {
                Ok(total) => {
                    debug!(day = %key.day, kind = key.kind.as_str(), total, "counter updated");
                    self.record_success();
                    written_buckets += 1;
                }
                Err(error) => {
                    warn!(
                        day = %key.day,
                        kind = key.kind.as_str(),
                        %error,
                        "counter write failed, abandoning batch"
                    );
                    self.sink.counter_write_failed();
                    self.record_failure();
                    return IngestReport {
                        accepted,
                        truncated,
                        written_buckets,
                        disposition: IngestDisposition::Aborted,
                    };
                }
            }
        }

        IngestReport {
            accepted,
            truncated,
            written_buckets,
            disposition: IngestDisposition::Completed,
        }
    }

    /// Non-zero counters recorded for a day, for the admin stats view.
    ///
    /// Reads bypass the breaker: it protects the write path from bursty
    /// telemetry, not occasional dashboard queries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counters cannot be read.
    pub async fn daily_counts(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(ActivityKind, u64)>, StorageError> {
        self.repo.counts_for_day(day).await
    }

    async fn bump_counter(&self, key: &BucketKey, add: u64) -> Result<u64, StorageError> {
        let current = self.repo.fetch_count(key).await?;
        let next = current.saturating_add(add);
        self.repo.store_count(key, next).await?;
        Ok(next)
    }

    fn breaker_open(&self) -> bool {
        match self.breaker.lock() {
            Ok(mut breaker) => breaker.is_open(self.clock.now()),
            // Poisoned lock: treat as open and drop the batch.
            Err(_) => true,
        }
    }

    fn record_success(&self) {
        if let Ok(mut breaker) = self.breaker.lock() {
            breaker.record_success();
        }
    }

    fn record_failure(&self) {
        if let Ok(mut breaker) = self.breaker.lock() {
            if breaker.record_failure(self.clock.now()) {
                warn!(
                    cooldown_secs = breaker.settings().cooldown.num_seconds(),
                    "activity breaker opened"
                );
                self.sink.breaker_opened();
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopSink;
    use ora_core::model::ActivityKind;
    use ora_core::time::{fixed_clock, fixed_now};

    fn instant_config() -> TrackerConfig {
        TrackerConfig {
            write_pause: Duration::ZERO,
            ..TrackerConfig::default()
        }
    }

    fn events(kind: ActivityKind, n: usize) -> Vec<ActivityEvent> {
        (0..n)
            .map(|_| ActivityEvent::new(kind, fixed_now()))
            .collect()
    }

    fn tracker(config: TrackerConfig, repo: Arc<dyn ActivityRepository>) -> ActivityTracker {
        ActivityTracker::new(config, fixed_clock(), repo, Arc::new(NoopSink))
    }

    #[tokio::test]
    async fn sequential_batches_accumulate() {
        let repo = Arc::new(storage::repository::InMemoryRepository::new());
        let tracker = tracker(instant_config(), repo.clone());

        let first = tracker.ingest(events(ActivityKind::PageView, 3)).await;
        let second = tracker.ingest(events(ActivityKind::PageView, 3)).await;
        assert_eq!(first.disposition, IngestDisposition::Completed);
        assert_eq!(second.disposition, IngestDisposition::Completed);

        let key = BucketKey::new(fixed_now().date_naive(), ActivityKind::PageView);
        assert_eq!(repo.fetch_count(&key).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn oversized_batch_is_truncated_before_grouping() {
        let repo = Arc::new(storage::repository::InMemoryRepository::new());
        let tracker = tracker(instant_config(), repo.clone());

        let report = tracker.ingest(events(ActivityKind::QuizAttempt, 8)).await;
        assert_eq!(report.accepted, 5);
        assert_eq!(report.truncated, 3);

        let key = BucketKey::new(fixed_now().date_naive(), ActivityKind::QuizAttempt);
        assert_eq!(repo.fetch_count(&key).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn disabled_tracker_ignores_batches() {
        let repo = Arc::new(storage::repository::InMemoryRepository::new());
        let config = TrackerConfig {
            enabled: false,
            ..instant_config()
        };
        let tracker = tracker(config, repo.clone());

        let report = tracker.ingest(events(ActivityKind::PageView, 2)).await;
        assert_eq!(report.disposition, IngestDisposition::Disabled);

        let key = BucketKey::new(fixed_now().date_naive(), ActivityKind::PageView);
        assert_eq!(repo.fetch_count(&key).await.unwrap(), 0);
    }
}
