use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use ora_core::BreakerSettings;
use ora_core::model::{ActivityEvent, ActivityKind, BucketKey};
use ora_core::time::{fixed_clock, fixed_now};
use services::{
    ActivityTracker, Clock, CountingSink, IngestDisposition, TelemetrySink, TrackerConfig,
};
use storage::repository::{ActivityRepository, InMemoryRepository, StorageError};

/// Wraps the in-memory repository and fails `store_count` while the fuse
/// is lit, counting every call either way.
struct FlakyActivityRepo {
    inner: InMemoryRepository,
    failures_left: AtomicU64,
    fetch_calls: AtomicU64,
    store_calls: AtomicU64,
}

impl FlakyActivityRepo {
    fn new(failures: u64) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryRepository::new(),
            failures_left: AtomicU64::new(failures),
            fetch_calls: AtomicU64::new(0),
            store_calls: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ActivityRepository for FlakyActivityRepo {
    async fn fetch_count(&self, key: &BucketKey) -> Result<u64, StorageError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch_count(key).await
    }

    async fn store_count(&self, key: &BucketKey, count: u64) -> Result<(), StorageError> {
        self.store_calls.fetch_add(1, Ordering::Relaxed);
        let left = self.failures_left.load(Ordering::Relaxed);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::Relaxed);
            return Err(StorageError::Connection("injected failure".into()));
        }
        self.inner.store_count(key, count).await
    }

    async fn counts_for_day(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(ActivityKind, u64)>, StorageError> {
        self.inner.counts_for_day(day).await
    }
}

fn instant_config() -> TrackerConfig {
    TrackerConfig {
        write_pause: Duration::ZERO,
        ..TrackerConfig::default()
    }
}

fn page_views(n: usize) -> Vec<ActivityEvent> {
    (0..n)
        .map(|_| ActivityEvent::new(ActivityKind::PageView, fixed_now()))
        .collect()
}

#[tokio::test]
async fn three_failing_batches_open_the_breaker() {
    let repo = FlakyActivityRepo::new(u64::MAX);
    let sink = CountingSink::new();
    let tracker = ActivityTracker::new(
        instant_config(),
        fixed_clock(),
        repo.clone(),
        Arc::clone(&sink) as Arc<dyn TelemetrySink>,
    );

    for _ in 0..3 {
        let report = tracker.ingest(page_views(2)).await;
        assert_eq!(report.disposition, IngestDisposition::Aborted);
        assert_eq!(report.written_buckets, 0);
    }
    assert_eq!(sink.breaker_trips.load(Ordering::Relaxed), 1);

    // Within the cooldown the next batch must not touch storage at all.
    let stores_before = repo.store_calls.load(Ordering::Relaxed);
    let fetches_before = repo.fetch_calls.load(Ordering::Relaxed);
    let report = tracker.ingest(page_views(4)).await;
    assert_eq!(report.disposition, IngestDisposition::BreakerOpen);
    assert_eq!(repo.store_calls.load(Ordering::Relaxed), stores_before);
    assert_eq!(repo.fetch_calls.load(Ordering::Relaxed), fetches_before);
    assert_eq!(sink.dropped_breaker.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn breaker_closes_again_after_cooldown() {
    let repo = FlakyActivityRepo::new(3);
    let config = TrackerConfig {
        breaker: BreakerSettings {
            failure_threshold: 3,
            cooldown: chrono::Duration::milliseconds(50),
        },
        ..instant_config()
    };
    let tracker = ActivityTracker::new(
        config,
        Clock::system(),
        repo.clone(),
        Arc::new(services::NoopSink),
    );

    for _ in 0..3 {
        let report = tracker.ingest(page_views(1)).await;
        assert_eq!(report.disposition, IngestDisposition::Aborted);
    }
    assert_eq!(
        tracker.ingest(page_views(1)).await.disposition,
        IngestDisposition::BreakerOpen
    );

    tokio::time::sleep(Duration::from_millis(80)).await;

    let report = tracker.ingest(page_views(2)).await;
    assert_eq!(report.disposition, IngestDisposition::Completed);

    let key = BucketKey::new(fixed_now().date_naive(), ActivityKind::PageView);
    assert_eq!(repo.inner.fetch_count(&key).await.unwrap(), 2);
}

#[tokio::test]
async fn mixed_batch_writes_one_bucket_per_kind() {
    let repo = Arc::new(InMemoryRepository::new());
    let tracker = ActivityTracker::new(
        instant_config(),
        fixed_clock(),
        repo.clone(),
        Arc::new(services::NoopSink),
    );

    let now = fixed_now();
    let report = tracker
        .ingest(vec![
            ActivityEvent::new(ActivityKind::PageView, now),
            ActivityEvent::new(ActivityKind::PageView, now),
            ActivityEvent::new(ActivityKind::QuizAttempt, now),
            ActivityEvent::new(ActivityKind::ChatMessage, now),
        ])
        .await;

    assert_eq!(report.disposition, IngestDisposition::Completed);
    assert_eq!(report.written_buckets, 3);

    let day = now.date_naive();
    let counts = repo.counts_for_day(day).await.unwrap();
    assert_eq!(
        counts,
        vec![
            (ActivityKind::ChatMessage, 1),
            (ActivityKind::PageView, 2),
            (ActivityKind::QuizAttempt, 1),
        ]
    );
}

#[tokio::test]
async fn failure_aborts_remaining_buckets() {
    let repo = FlakyActivityRepo::new(0);
    let now = fixed_now();
    let tracker = ActivityTracker::new(
        instant_config(),
        fixed_clock(),
        repo.clone(),
        Arc::new(services::NoopSink),
    );

    // Prime a counter, then arm exactly one store failure.
    let report = tracker
        .ingest(vec![ActivityEvent::new(ActivityKind::PageView, now)])
        .await;
    assert_eq!(report.disposition, IngestDisposition::Completed);

    repo.failures_left.store(1, Ordering::Relaxed);
    let report = tracker
        .ingest(vec![
            ActivityEvent::new(ActivityKind::PageView, now),
            ActivityEvent::new(ActivityKind::QuizAttempt, now),
        ])
        .await;

    // Buckets are visited in key order: page_view's store fails and the
    // quiz bucket is never attempted.
    assert_eq!(report.disposition, IngestDisposition::Aborted);
    assert_eq!(report.written_buckets, 0);

    let day = now.date_naive();
    let page = BucketKey::new(day, ActivityKind::PageView);
    let quiz = BucketKey::new(day, ActivityKind::QuizAttempt);
    // The failed read-increment-write left the primed count untouched.
    assert_eq!(repo.inner.fetch_count(&page).await.unwrap(), 1);
    assert_eq!(repo.inner.fetch_count(&quiz).await.unwrap(), 0);

    // One armed failure, so the streak is broken by the next success.
    let report = tracker.ingest(page_views(1)).await;
    assert_eq!(report.disposition, IngestDisposition::Completed);
    assert_eq!(repo.inner.fetch_count(&page).await.unwrap(), 2);
}
