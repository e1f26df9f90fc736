use ora_core::model::{
    ActivityKind, Asset, AssetId, AssetKind, Badge, CompletedLesson, LessonId,
};
use sqlx::Row;
use uuid::Uuid;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn count_to_i64(count: u64) -> Result<i64, StorageError> {
    i64::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
}

pub(crate) fn count_from_i64(v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("negative count: {v}")))
}

pub(crate) fn kind_from_str(s: &str) -> Result<ActivityKind, StorageError> {
    ActivityKind::from_key(s).map_err(ser)
}

pub(crate) fn badge_from_str(s: &str) -> Result<Badge, StorageError> {
    Badge::from_key(s).map_err(ser)
}

pub(crate) fn asset_id_from_str(s: &str) -> Result<AssetId, StorageError> {
    let uuid = Uuid::parse_str(s)
        .map_err(|_| StorageError::Serialization(format!("invalid asset id: {s}")))?;
    Ok(AssetId::from_uuid(uuid))
}

pub(crate) fn map_completed_lesson_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<CompletedLesson, StorageError> {
    let lesson_id =
        LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?).map_err(ser)?;

    let score: i64 = row.try_get("score").map_err(ser)?;
    let score = i32::try_from(score)
        .map_err(|_| StorageError::Serialization(format!("score out of range: {score}")))?;

    let points_i64: i64 = row.try_get("points_earned").map_err(ser)?;
    let points_earned = u32::try_from(points_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid points: {points_i64}")))?;

    Ok(CompletedLesson {
        lesson_id,
        title: row.try_get("title").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        score,
        points_earned,
    })
}

pub(crate) fn map_asset_row(row: &sqlx::sqlite::SqliteRow) -> Result<Asset, StorageError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    let kind: AssetKind = AssetKind::from_key(&kind_str).map_err(ser)?;

    let size_i64: i64 = row.try_get("size_bytes").map_err(ser)?;
    let size_bytes = u64::try_from(size_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid size: {size_i64}")))?;

    Ok(Asset {
        id: asset_id_from_str(row.try_get::<String, _>("id").map_err(ser)?.as_str())?,
        kind,
        title: row.try_get("title").map_err(ser)?,
        file_name: row.try_get("file_name").map_err(ser)?,
        content_type: row.try_get("content_type").map_err(ser)?,
        size_bytes,
        uploaded_at: row.try_get("uploaded_at").map_err(ser)?,
    })
}
