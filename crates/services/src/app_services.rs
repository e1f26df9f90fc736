use std::path::Path;
use std::sync::Arc;

use ora_core::Clock;
use ora_core::model::DEFAULT_CATALOG_SIZE;
use storage::bucket::{FsBucket, MemoryBucket, ObjectBucket};
use storage::repository::Storage;

use crate::asset_service::AssetService;
use crate::error::AppServicesError;
use crate::metrics::{NoopSink, TelemetrySink};
use crate::progress_service::ProgressService;
use crate::tracker::{ActivityTracker, TrackerConfig};

/// Assembles the app-facing services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    tracker: Arc<ActivityTracker>,
    assets: Arc<AssetService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and a filesystem bucket.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the bucket
    /// directory setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        asset_dir: &Path,
        clock: Clock,
        tracker_config: TrackerConfig,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let bucket: Arc<dyn ObjectBucket> = Arc::new(FsBucket::open(asset_dir)?);
        Ok(Self::assemble(storage, bucket, clock, tracker_config, sink))
    }

    /// Build fully in-memory services for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock, tracker_config: TrackerConfig) -> Self {
        let storage = Storage::in_memory();
        let bucket: Arc<dyn ObjectBucket> = Arc::new(MemoryBucket::new());
        Self::assemble(storage, bucket, clock, tracker_config, Arc::new(NoopSink))
    }

    fn assemble(
        storage: Storage,
        bucket: Arc<dyn ObjectBucket>,
        clock: Clock,
        tracker_config: TrackerConfig,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let progress = Arc::new(ProgressService::new(
            clock,
            DEFAULT_CATALOG_SIZE,
            Arc::clone(&storage.progress),
            Arc::clone(&sink),
        ));
        let tracker = Arc::new(ActivityTracker::new(
            tracker_config,
            clock,
            Arc::clone(&storage.activity),
            sink,
        ));
        let assets = Arc::new(AssetService::new(clock, Arc::clone(&storage.assets), bucket));

        Self {
            progress,
            tracker,
            assets,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<ActivityTracker> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn assets(&self) -> Arc<AssetService> {
        Arc::clone(&self.assets)
    }
}
