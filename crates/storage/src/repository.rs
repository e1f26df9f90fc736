use async_trait::async_trait;
use chrono::NaiveDate;
use ora_core::model::{
    ActivityKind, Asset, AssetId, BucketKey, LearnerProgress, ProfileId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for learner progress.
///
/// A profile's ledger is loaded and saved as a whole: progress writes
/// replace every row for the profile in one transaction, which keeps the
/// source's overwrite-the-blob semantics while staying queryable.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch a profile's progress, or `None` if the profile is unknown.
    ///
    /// `catalog_size` parameterises the rehydrated ledger (it is content
    /// configuration, not persisted state).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read or decoded.
    async fn load_progress(
        &self,
        profile: &ProfileId,
        catalog_size: u32,
    ) -> Result<Option<LearnerProgress>, StorageError>;

    /// Persist a profile's full progress, replacing any prior state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn save_progress(
        &self,
        profile: &ProfileId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError>;
}

/// Repository contract for daily activity counters.
///
/// Callers perform read-increment-write cycles; the repository itself does
/// not add, so interleaved writers can still clobber each other. That is
/// acceptable for approximate telemetry counts.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Current count for a `(day, kind)` bucket; zero when absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be read.
    async fn fetch_count(&self, key: &BucketKey) -> Result<u64, StorageError>;

    /// Overwrite the count for a `(day, kind)` bucket.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn store_count(&self, key: &BucketKey, count: u64) -> Result<(), StorageError>;

    /// All non-zero counters recorded for a day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read.
    async fn counts_for_day(&self, day: NaiveDate)
    -> Result<Vec<(ActivityKind, u64)>, StorageError>;
}

/// Repository contract for asset metadata.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert a new asset row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists.
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StorageError>;

    /// Fetch one asset by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be read.
    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StorageError>;

    /// All assets, newest upload first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read.
    async fn list_assets(&self) -> Result<Vec<Asset>, StorageError>;

    /// Delete an asset row, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete_asset(&self, id: AssetId) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<ProfileId, LearnerProgress>>>,
    counts: Arc<Mutex<HashMap<BucketKey, u64>>>,
    assets: Arc<Mutex<Vec<Asset>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(
        &self,
        profile: &ProfileId,
        catalog_size: u32,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(profile).cloned().map(|mut p| {
            // Stored clone carries whatever catalog size it was saved with;
            // rehydrate against the caller's.
            if p.catalog_size() != catalog_size {
                p = LearnerProgress::from_persisted(
                    p.total_points(),
                    p.badges().to_vec(),
                    p.completed().to_vec(),
                    catalog_size,
                )
                .unwrap_or(p);
            }
            p
        }))
    }

    async fn save_progress(
        &self,
        profile: &ProfileId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(profile.clone(), progress.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn fetch_count(&self, key: &BucketKey) -> Result<u64, StorageError> {
        let guard = self
            .counts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).copied().unwrap_or(0))
    }

    async fn store_count(&self, key: &BucketKey, count: u64) -> Result<(), StorageError> {
        let mut guard = self
            .counts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(*key, count);
        Ok(())
    }

    async fn counts_for_day(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(ActivityKind, u64)>, StorageError> {
        let guard = self
            .counts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<_> = guard
            .iter()
            .filter(|(key, count)| key.day == day && **count > 0)
            .map(|(key, count)| (key.kind, *count))
            .collect();
        out.sort_by_key(|(kind, _)| kind.as_str());
        Ok(out)
    }
}

#[async_trait]
impl AssetRepository for InMemoryRepository {
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StorageError> {
        let mut guard = self
            .assets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|a| a.id == asset.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(asset.clone());
        Ok(())
    }

    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StorageError> {
        let guard = self
            .assets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().find(|a| a.id == id).cloned())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, StorageError> {
        let guard = self
            .assets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out = guard.clone();
        out.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(out)
    }

    async fn delete_asset(&self, id: AssetId) -> Result<bool, StorageError> {
        let mut guard = self
            .assets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|a| a.id != id);
        Ok(guard.len() != before)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub activity: Arc<dyn ActivityRepository>,
    pub assets: Arc<dyn AssetRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let activity: Arc<dyn ActivityRepository> = Arc::new(repo.clone());
        let assets: Arc<dyn AssetRepository> = Arc::new(repo);
        Self {
            progress,
            activity,
            assets,
        }
    }
}
