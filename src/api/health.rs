//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub queue_depth: usize,
    pub queue_max_size: u32,
    pub chat_backend: String,
}

/// `GET /health`
///
/// Always 200 while the process is up; backend reachability is a
/// per-check concern, not a liveness one.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        queue_depth: state.queue.depth(),
        queue_max_size: state.queue.config().max_size,
        chat_backend: state.gateway.chat_backend_name().to_string(),
    })
}
