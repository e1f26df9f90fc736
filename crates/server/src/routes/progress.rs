//! Handlers for learner progress endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use ora_core::model::{Badge, CompletedLesson, LearnerProgress, LessonId, ProfileId};
use services::CompletionReceipt;

use super::AppState;
use crate::error::ApiError;

/// Wire shape for a progress snapshot.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub total_points: u32,
    pub badges: Vec<Badge>,
    pub completed: Vec<CompletedLesson>,
}

impl From<LearnerProgress> for ProgressView {
    fn from(progress: LearnerProgress) -> Self {
        Self {
            total_points: progress.total_points(),
            badges: progress.badges().to_vec(),
            completed: progress.completed().to_vec(),
        }
    }
}

fn parse_profile(raw: &str) -> Result<ProfileId, ApiError> {
    ProfileId::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// `GET /progress/{profile}`
pub async fn snapshot(
    State(state): State<AppState>,
    Path(profile): Path<String>,
) -> Result<Json<ProgressView>, ApiError> {
    let profile = parse_profile(&profile)?;
    let progress = state.services.progress().progress(&profile).await;
    Ok(Json(ProgressView::from(progress)))
}

/// JSON body accepted by `POST /progress/{profile}/completions`.
#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub lesson_id: String,
    pub title: String,
    pub score: i32,
}

/// `POST /progress/{profile}/completions`
///
/// Duplicate submissions return a zero receipt rather than an error.
pub async fn record_completion(
    State(state): State<AppState>,
    Path(profile): Path<String>,
    Json(body): Json<CompletionBody>,
) -> Result<Json<CompletionReceipt>, ApiError> {
    let profile = parse_profile(&profile)?;
    let lesson_id =
        LessonId::new(body.lesson_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let receipt = state
        .services
        .progress()
        .record_completion(&profile, lesson_id, &body.title, body.score)
        .await;
    Ok(Json(receipt))
}
