use chrono::Utc;
use ora_core::model::{LearnerProgress, ProfileId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{badge_from_str, map_completed_lesson_row},
};
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(
        &self,
        profile: &ProfileId,
        catalog_size: u32,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let header = sqlx::query(
            r"
                SELECT total_points FROM learner_progress
                WHERE profile_id = ?1
            ",
        )
        .bind(profile.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        let Some(header) = header else {
            return Ok(None);
        };
        let total_i64: i64 = header.try_get("total_points").map_err(conn)?;
        let total_points = u32::try_from(total_i64)
            .map_err(|_| StorageError::Serialization(format!("invalid total: {total_i64}")))?;

        let lesson_rows = sqlx::query(
            r"
                SELECT lesson_id, title, score, points_earned, completed_at
                FROM completed_lessons
                WHERE profile_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(profile.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut completed = Vec::with_capacity(lesson_rows.len());
        for row in &lesson_rows {
            completed.push(map_completed_lesson_row(row)?);
        }

        let badge_rows = sqlx::query(
            r"
                SELECT badge FROM learner_badges
                WHERE profile_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(profile.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut badges = Vec::with_capacity(badge_rows.len());
        for row in &badge_rows {
            let key: String = row.try_get("badge").map_err(conn)?;
            badges.push(badge_from_str(&key)?);
        }

        let progress = LearnerProgress::from_persisted(total_points, badges, completed, catalog_size)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(progress))
    }

    async fn save_progress(
        &self,
        profile: &ProfileId,
        progress: &LearnerProgress,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool().begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO learner_progress (profile_id, total_points, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(profile_id) DO UPDATE SET
                    total_points = excluded.total_points,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(profile.as_str())
        .bind(i64::from(progress.total_points()))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Full replace: the ledger is saved as a whole, so stale rows from
        // a previous save cannot survive a shrinking edit.
        sqlx::query("DELETE FROM completed_lessons WHERE profile_id = ?1")
            .bind(profile.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM learner_badges WHERE profile_id = ?1")
            .bind(profile.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, lesson) in progress.completed().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO completed_lessons (
                        profile_id, lesson_id, position, title, score,
                        points_earned, completed_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(profile.as_str())
            .bind(lesson.lesson_id.as_str())
            .bind(i64::try_from(position).map_err(conn)?)
            .bind(lesson.title.as_str())
            .bind(i64::from(lesson.score))
            .bind(i64::from(lesson.points_earned))
            .bind(lesson.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        for (position, badge) in progress.badges().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO learner_badges (profile_id, badge, position)
                    VALUES (?1, ?2, ?3)
                ",
            )
            .bind(profile.as_str())
            .bind(badge.as_str())
            .bind(i64::try_from(position).map_err(conn)?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)
    }
}
