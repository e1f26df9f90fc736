//! Shared error types for the services crate.

use thiserror::Error;

use ora_core::model::AssetError;
use storage::bucket::BucketError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `AssetService`.
///
/// Asset management is admin-facing, so unlike the telemetry paths it
/// reports failures to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssetServiceError {
    #[error("asset not found")]
    NotFound,
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Bucket(#[from] BucketError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Bucket(#[from] BucketError),
}
