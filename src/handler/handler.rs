use crate::app::AppState;
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route(
            "/api/evaluation/generate-full-report",
            post(super::evaluation::generate_full_report),
        )
        .route(
            "/api/evaluation/generate-from-local",
            post(super::evaluation::generate_from_local),
        )
        .route("/api/reports/generate", post(super::reports::generate_report))
        .route("/api/gemini/analyze-call", post(super::analysis::analyze_call))
        .nest("/api/hamsa", super::hamsa::router())
}

async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

async fn version() -> Response {
    Json(crate::version::version_info()).into_response()
}
