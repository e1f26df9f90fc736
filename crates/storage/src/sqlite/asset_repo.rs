use ora_core::model::{Asset, AssetId};

use super::{SqliteRepository, mapping::map_asset_row};
use crate::repository::{AssetRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl AssetRepository for SqliteRepository {
    async fn insert_asset(&self, asset: &Asset) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
                INSERT INTO assets (
                    id, kind, title, file_name, content_type, size_bytes, uploaded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(asset.id.value().to_string())
        .bind(asset.kind.as_str())
        .bind(asset.title.as_str())
        .bind(asset.file_name.as_str())
        .bind(asset.content_type.as_str())
        .bind(
            i64::try_from(asset.size_bytes)
                .map_err(|_| StorageError::Serialization("size overflow".into()))?,
        )
        .bind(asset.uploaded_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, kind, title, file_name, content_type, size_bytes, uploaded_at
                FROM assets
                WHERE id = ?1
            ",
        )
        .bind(id.value().to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        row.as_ref().map(map_asset_row).transpose()
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, kind, title, file_name, content_type, size_bytes, uploaded_at
                FROM assets
                ORDER BY uploaded_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(map_asset_row(row)?);
        }
        Ok(out)
    }

    async fn delete_asset(&self, id: AssetId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?1")
            .bind(id.value().to_string())
            .execute(self.pool())
            .await
            .map_err(conn)?;
        Ok(result.rows_affected() > 0)
    }
}
