use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    uptime: f64,
    timestamp: i64,
    message: &'static str,
}

/// GET `/health` — liveness probe with process uptime.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now().timestamp_millis(),
        message: "REST API is healthy",
    })
}
