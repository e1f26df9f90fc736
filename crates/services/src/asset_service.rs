use std::sync::Arc;

use tracing::{info, warn};

use ora_core::Clock;
use ora_core::model::{Asset, AssetId, NewAsset};
use storage::bucket::ObjectBucket;
use storage::repository::AssetRepository;

use crate::error::AssetServiceError;

/// Manages the lesson PDF and video library: metadata rows plus payloads
/// in an object bucket, addressed by the asset id.
pub struct AssetService {
    clock: Clock,
    repo: Arc<dyn AssetRepository>,
    bucket: Arc<dyn ObjectBucket>,
}

impl AssetService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn AssetRepository>, bucket: Arc<dyn ObjectBucket>) -> Self {
        Self {
            clock,
            repo,
            bucket,
        }
    }

    /// Store a new asset: payload first, then the metadata row.
    ///
    /// If the row insert fails the payload is removed again so the bucket
    /// doesn't accumulate orphans.
    ///
    /// # Errors
    ///
    /// Returns `AssetServiceError` if validation, the payload write, or
    /// the row insert fails.
    pub async fn upload(
        &self,
        title: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Asset, AssetServiceError> {
        let new_asset = NewAsset::validate(title, file_name, content_type, bytes.len() as u64)?;
        let id = AssetId::generate();
        let asset = new_asset.into_asset(id, self.clock.now());

        self.bucket.put(&object_name(id), bytes).await?;
        if let Err(error) = self.repo.insert_asset(&asset).await {
            if let Err(cleanup) = self.bucket.delete(&object_name(id)).await {
                warn!(%id, %cleanup, "orphaned payload after failed insert");
            }
            return Err(error.into());
        }

        info!(%id, kind = asset.kind.as_str(), size = asset.size_bytes, "asset stored");
        Ok(asset)
    }

    /// All assets, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AssetServiceError` if the listing cannot be read.
    pub async fn list(&self) -> Result<Vec<Asset>, AssetServiceError> {
        Ok(self.repo.list_assets().await?)
    }

    /// Fetch an asset's metadata and payload.
    ///
    /// # Errors
    ///
    /// Returns `AssetServiceError::NotFound` if the id is unknown, or
    /// other errors if the row or payload cannot be read.
    pub async fn download(&self, id: AssetId) -> Result<(Asset, Vec<u8>), AssetServiceError> {
        let asset = self
            .repo
            .get_asset(id)
            .await?
            .ok_or(AssetServiceError::NotFound)?;
        let bytes = self.bucket.get(&object_name(id)).await?;
        Ok((asset, bytes))
    }

    /// Remove an asset: row first, then payload.
    ///
    /// A missing payload is tolerated (the row is the source of truth);
    /// a payload that fails to delete for another reason is logged and
    /// left for a cleanup sweep.
    ///
    /// # Errors
    ///
    /// Returns `AssetServiceError::NotFound` if the id is unknown.
    pub async fn delete(&self, id: AssetId) -> Result<(), AssetServiceError> {
        if !self.repo.delete_asset(id).await? {
            return Err(AssetServiceError::NotFound);
        }
        if let Err(error) = self.bucket.delete(&object_name(id)).await {
            warn!(%id, %error, "payload delete failed after row removal");
        }
        info!(%id, "asset deleted");
        Ok(())
    }
}

fn object_name(id: AssetId) -> String {
    id.to_string()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use ora_core::model::AssetKind;
    use ora_core::time::fixed_clock;
    use storage::bucket::MemoryBucket;
    use storage::repository::InMemoryRepository;

    fn service() -> AssetService {
        AssetService::new(
            fixed_clock(),
            Arc::new(InMemoryRepository::new()),
            Arc::new(MemoryBucket::new()),
        )
    }

    #[tokio::test]
    async fn upload_download_delete_round_trip() {
        let service = service();

        let asset = service
            .upload("Workbook", "workbook.pdf", "application/pdf", b"%PDF-1.7")
            .await
            .unwrap();
        assert_eq!(asset.kind, AssetKind::Pdf);
        assert_eq!(asset.size_bytes, 8);

        let (fetched, bytes) = service.download(asset.id).await.unwrap();
        assert_eq!(fetched, asset);
        assert_eq!(bytes, b"%PDF-1.7");

        service.delete(asset.id).await.unwrap();
        assert!(matches!(
            service.download(asset.id).await.unwrap_err(),
            AssetServiceError::NotFound
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let service = service();
        // Fixed clock makes uploads simultaneous; both must still appear.
        service
            .upload("One", "one.pdf", "application/pdf", b"a")
            .await
            .unwrap();
        service
            .upload("Two", "two.mp4", "video/mp4", b"bb")
            .await
            .unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn invalid_metadata_is_rejected_before_any_write() {
        let service = service();
        let err = service
            .upload("Poster", "poster.png", "image/png", b"png")
            .await
            .unwrap_err();
        assert!(matches!(err, AssetServiceError::Asset(_)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_asset_reports_not_found() {
        let service = service();
        let err = service.delete(AssetId::generate()).await.unwrap_err();
        assert!(matches!(err, AssetServiceError::NotFound));
    }
}
