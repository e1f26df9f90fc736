use chrono::NaiveDate;
use ora_core::model::{ActivityKind, BucketKey};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{count_from_i64, count_to_i64, kind_from_str},
};
use crate::repository::{ActivityRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ActivityRepository for SqliteRepository {
    async fn fetch_count(&self, key: &BucketKey) -> Result<u64, StorageError> {
        let row = sqlx::query(
            r"
                SELECT count FROM activity_counts
                WHERE day = ?1 AND kind = ?2
            ",
        )
        .bind(key.day)
        .bind(key.kind.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => count_from_i64(row.try_get("count").map_err(conn)?),
            None => Ok(0),
        }
    }

    async fn store_count(&self, key: &BucketKey, count: u64) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO activity_counts (day, kind, count)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(day, kind) DO UPDATE SET count = excluded.count
            ",
        )
        .bind(key.day)
        .bind(key.kind.as_str())
        .bind(count_to_i64(count)?)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn counts_for_day(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<(ActivityKind, u64)>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT kind, count FROM activity_counts
                WHERE day = ?1 AND count > 0
                ORDER BY kind ASC
            ",
        )
        .bind(day)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let kind_str: String = row.try_get("kind").map_err(conn)?;
            let kind = kind_from_str(&kind_str)?;
            out.push((kind, count_from_i64(row.try_get("count").map_err(conn)?)?));
        }
        Ok(out)
    }
}
