use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by object buckets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BucketError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object name: {0}")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Flat blob storage for asset payloads.
///
/// Objects are addressed by a single-segment name (no path separators);
/// the asset id's string form is the conventional name. This mirrors the
/// hosted storage bucket the platform originally uploaded PDFs and videos
/// to, behind a seam the services can swap in tests.
#[async_trait]
pub trait ObjectBucket: Send + Sync {
    /// Store an object, replacing any previous payload under that name.
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the name is invalid or the write fails.
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BucketError>;

    /// Fetch an object's payload.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::NotFound` if the object does not exist.
    async fn get(&self, name: &str) -> Result<Vec<u8>, BucketError>;

    /// Remove an object, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `BucketError` if the removal fails for another reason.
    async fn delete(&self, name: &str) -> Result<bool, BucketError>;
}

fn check_name(name: &str) -> Result<(), BucketError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(BucketError::InvalidName(name.to_string()));
    }
    Ok(())
}

//
// ─── FILESYSTEM BUCKET ────────────────────────────────────────────────────────
//

/// Directory-backed bucket: one file per object under a root directory.
#[derive(Debug, Clone)]
pub struct FsBucket {
    root: PathBuf,
}

impl FsBucket {
    /// Open a bucket rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BucketError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| BucketError::Io(e.to_string()))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl ObjectBucket for FsBucket {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BucketError> {
        check_name(name)?;
        tokio::fs::write(self.root.join(name), bytes)
            .await
            .map_err(|e| BucketError::Io(e.to_string()))
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, BucketError> {
        check_name(name)?;
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BucketError::NotFound(name.to_string()))
            }
            Err(e) => Err(BucketError::Io(e.to_string())),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool, BucketError> {
        check_name(name)?;
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BucketError::Io(e.to_string())),
        }
    }
}

//
// ─── IN-MEMORY BUCKET ─────────────────────────────────────────────────────────
//

/// Map-backed bucket for tests and prototyping.
#[derive(Debug, Clone, Default)]
pub struct MemoryBucket {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectBucket for MemoryBucket {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BucketError> {
        check_name(name)?;
        let mut guard = self
            .objects
            .lock()
            .map_err(|e| BucketError::Io(e.to_string()))?;
        guard.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, BucketError> {
        check_name(name)?;
        let guard = self
            .objects
            .lock()
            .map_err(|e| BucketError::Io(e.to_string()))?;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| BucketError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<bool, BucketError> {
        check_name(name)?;
        let mut guard = self
            .objects
            .lock()
            .map_err(|e| BucketError::Io(e.to_string()))?;
        Ok(guard.remove(name).is_some())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_bucket_round_trips() {
        let bucket = MemoryBucket::new();
        bucket.put("a", b"payload").await.unwrap();
        assert_eq!(bucket.get("a").await.unwrap(), b"payload");
        assert!(bucket.delete("a").await.unwrap());
        assert!(!bucket.delete("a").await.unwrap());
        assert!(matches!(
            bucket.get("a").await.unwrap_err(),
            BucketError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn path_segments_are_rejected() {
        let bucket = MemoryBucket::new();
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                bucket.put(bad, b"x").await.unwrap_err(),
                BucketError::InvalidName(_)
            ));
        }
    }

    #[tokio::test]
    async fn fs_bucket_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let bucket = FsBucket::open(dir.path().join("assets")).unwrap();

        bucket.put("intro.pdf", b"%PDF-1.7").await.unwrap();
        assert_eq!(bucket.get("intro.pdf").await.unwrap(), b"%PDF-1.7");
        assert!(bucket.delete("intro.pdf").await.unwrap());
        assert!(!bucket.delete("intro.pdf").await.unwrap());
    }
}
