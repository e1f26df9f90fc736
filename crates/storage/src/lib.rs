#![forbid(unsafe_code)]

pub mod bucket;
pub mod repository;
pub mod sqlite;

pub use bucket::{BucketError, FsBucket, MemoryBucket, ObjectBucket};
pub use repository::{
    ActivityRepository, AssetRepository, InMemoryRepository, ProgressRepository, Storage,
    StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
