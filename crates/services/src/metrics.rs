//! Injectable observability hook for the never-fail services.
//!
//! The progress and tracking services swallow storage errors by contract,
//! so silent data loss would otherwise be invisible. Every swallowed
//! failure and dropped batch is reported here; deployments plug in a sink
//! that feeds their metrics pipeline, tests use [`CountingSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why an ingest batch was dropped without touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Tracking is switched off in the tracker config.
    Disabled,
    /// The circuit breaker is open.
    BreakerOpen,
}

/// Counters for events the services absorb instead of returning.
///
/// All methods default to no-ops so sinks implement only what they watch.
pub trait TelemetrySink: Send + Sync {
    /// Stored progress could not be loaded and was reset to fresh state.
    fn progress_load_reset(&self) {}

    /// A progress save failed after the receipt was already computed.
    fn progress_save_failed(&self) {}

    /// A completion was rejected before reaching the ledger (bad input).
    fn completion_rejected(&self) {}

    /// An ingest batch was dropped wholesale.
    fn batch_dropped(&self, reason: DropReason) {
        let _ = reason;
    }

    /// A counter read-increment-write cycle failed.
    fn counter_write_failed(&self) {}

    /// The circuit breaker tripped open.
    fn breaker_opened(&self) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

/// Sink that counts every report, for tests and local inspection.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub load_resets: AtomicU64,
    pub save_failures: AtomicU64,
    pub rejected_completions: AtomicU64,
    pub dropped_disabled: AtomicU64,
    pub dropped_breaker: AtomicU64,
    pub failed_writes: AtomicU64,
    pub breaker_trips: AtomicU64,
}

impl CountingSink {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl TelemetrySink for CountingSink {
    fn progress_load_reset(&self) {
        self.load_resets.fetch_add(1, Ordering::Relaxed);
    }

    fn progress_save_failed(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn completion_rejected(&self) {
        self.rejected_completions.fetch_add(1, Ordering::Relaxed);
    }

    fn batch_dropped(&self, reason: DropReason) {
        match reason {
            DropReason::Disabled => self.dropped_disabled.fetch_add(1, Ordering::Relaxed),
            DropReason::BreakerOpen => self.dropped_breaker.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn counter_write_failed(&self) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
    }

    fn breaker_opened(&self) {
        self.breaker_trips.fetch_add(1, Ordering::Relaxed);
    }
}
