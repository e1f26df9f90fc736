//! Handlers for telemetry ingestion and the admin activity view.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ora_core::model::{ActivityEvent, ActivityKind};
use services::IngestReport;

use super::AppState;
use crate::error::ApiError;

/// One event in a `POST /track` batch.
///
/// `occurred_at` defaults to the server's receive time, matching clients
/// that fire-and-forget without a clock of their own.
#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub kind: ActivityKind,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct TrackBody {
    pub events: Vec<EventBody>,
}

/// `POST /track` — always accepted; the report says what actually stuck.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<TrackBody>,
) -> (StatusCode, Json<IngestReport>) {
    let received_at = Utc::now();
    let events: Vec<ActivityEvent> = body
        .events
        .into_iter()
        .map(|e| ActivityEvent::new(e.kind, e.occurred_at.unwrap_or(received_at)))
        .collect();

    let report = state.services.tracker().ingest(events).await;
    (StatusCode::ACCEPTED, Json(report))
}

#[derive(Debug, Serialize)]
pub struct DailyCount {
    pub kind: ActivityKind,
    pub count: u64,
}

/// `GET /activity/{day}` — admin-only counter dump for one UTC day.
pub async fn daily_counts(
    State(state): State<AppState>,
    Path(day): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.allowlist.authorize(&headers)?;

    let day: NaiveDate = day
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid day: {day}")))?;

    let counts = state.services.tracker().daily_counts(day).await?;
    let out: Vec<DailyCount> = counts
        .into_iter()
        .map(|(kind, count)| DailyCount { kind, count })
        .collect();
    Ok(Json(out))
}
