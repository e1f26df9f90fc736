//! JSON REST API over the platform services.
//!
//! | Method   | Path                                  | Auth  |
//! |----------|---------------------------------------|-------|
//! | `POST`   | `/api/track`                          | none  |
//! | `GET`    | `/api/progress/{profile}`             | none  |
//! | `POST`   | `/api/progress/{profile}/completions` | none  |
//! | `GET`    | `/api/activity/{day}`                 | admin |
//! | `GET`    | `/api/assets`                         | none  |
//! | `GET`    | `/api/assets/{id}`                    | none  |
//! | `POST`   | `/api/assets`                         | admin |
//! | `DELETE` | `/api/assets/{id}`                    | admin |

pub mod assets;
pub mod progress;
pub mod track;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use services::AppServices;

use crate::auth::AdminAllowlist;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub allowlist: Arc<AdminAllowlist>,
}

/// Build a fully-materialised API router for the service stack.
pub fn api_router(state: AppState) -> Router<()> {
    Router::new()
        // Telemetry
        .route("/track", post(track::ingest))
        .route("/activity/{day}", get(track::daily_counts))
        // Progress
        .route(
            "/progress/{profile}",
            get(progress::snapshot),
        )
        .route(
            "/progress/{profile}/completions",
            post(progress::record_completion),
        )
        // Assets
        .route("/assets", get(assets::list).post(assets::upload))
        .route(
            "/assets/{id}",
            get(assets::download).delete(assets::delete),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use services::{Clock, TrackerConfig};
    use tower::ServiceExt;

    fn test_router() -> Router<()> {
        let config = TrackerConfig {
            write_pause: std::time::Duration::ZERO,
            ..TrackerConfig::default()
        };
        let state = AppState {
            services: AppServices::in_memory(Clock::system(), config),
            allowlist: Arc::new(AdminAllowlist::from_csv("admin@ora.example")),
        };
        Router::new().nest("/api", api_router(state))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn completion_flow_awards_points_and_shows_in_snapshot() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/progress/learner-1/completions",
                json!({"lesson_id": "intro", "title": "Intro", "score": 90}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = body_json(response).await;
        assert_eq!(receipt["points_earned"], 100);
        assert_eq!(receipt["new_badge"], "first-lesson");

        let response = app
            .oneshot(get_request("/api/progress/learner-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = body_json(response).await;
        assert_eq!(snapshot["total_points"], 100);
        assert_eq!(snapshot["completed"][0]["lesson_id"], "intro");
    }

    #[tokio::test]
    async fn track_accepts_batches_and_admin_sees_counts() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/track",
                json!({"events": [{"kind": "page_view"}, {"kind": "page_view"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let report = body_json(response).await;
        assert_eq!(report["accepted"], 2);
        assert_eq!(report["disposition"], "completed");

        let day = chrono::Utc::now().date_naive();
        let uri = format!("/api/activity/{day}");

        // No admin header: locked out.
        let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(&uri)
                    .header("x-admin-email", "admin@ora.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let counts = body_json(response).await;
        assert_eq!(counts[0]["kind"], "page_view");
        assert_eq!(counts[0]["count"], 2);
    }

    #[tokio::test]
    async fn asset_upload_is_admin_gated() {
        let app = test_router();
        let body = json!({
            "title": "Workbook",
            "file_name": "workbook.pdf",
            "content_type": "application/pdf",
            "data": "JVBERi0xLjc=",
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/assets", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/assets")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-admin-email", "Admin@Ora.example")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["kind"], "pdf");

        let response = app.oneshot(get_request("/api/assets")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let app = test_router();
        let response = app
            .oneshot(get_request(
                "/api/assets/00000000-0000-4000-8000-000000000000",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "asset not found");
    }
}
