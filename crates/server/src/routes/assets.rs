//! Handlers for the asset library endpoints.
//!
//! Payloads travel base64-encoded inside JSON bodies; listings return
//! metadata only.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ora_core::model::{Asset, AssetId};

use super::AppState;
use crate::error::ApiError;

fn parse_asset_id(raw: &str) -> Result<AssetId, ApiError> {
    Uuid::parse_str(raw)
        .map(AssetId::from_uuid)
        .map_err(|_| ApiError::BadRequest(format!("invalid asset id: {raw}")))
}

/// `GET /assets` — metadata listing, newest upload first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(state.services.assets().list().await?))
}

/// JSON body accepted by `POST /assets`.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

/// `POST /assets` — admin-only; returns 201 + the stored metadata.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.allowlist.authorize(&headers)?;

    let bytes = BASE64
        .decode(body.data.as_bytes())
        .map_err(|_| ApiError::BadRequest("payload is not valid base64".into()))?;

    let asset = state
        .services
        .assets()
        .upload(&body.title, &body.file_name, &body.content_type, &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Wire shape for a single-asset fetch: metadata plus payload.
#[derive(Debug, Serialize)]
pub struct AssetWithData {
    #[serde(flatten)]
    pub asset: Asset,
    /// Base64-encoded payload.
    pub data: String,
}

/// `GET /assets/{id}`
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssetWithData>, ApiError> {
    let id = parse_asset_id(&id)?;
    let (asset, bytes) = state.services.assets().download(id).await?;
    Ok(Json(AssetWithData {
        asset,
        data: BASE64.encode(bytes),
    }))
}

/// `DELETE /assets/{id}` — admin-only; 204 on success.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.allowlist.authorize(&headers)?;

    let id = parse_asset_id(&id)?;
    state.services.assets().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
