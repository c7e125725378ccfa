//! # Metrics HTTP Handlers
//!
//! Axum handlers for metrics endpoints.

use crate::api::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `GET /metrics` - Prometheus text exposition format.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_collector.render_metrics(),
    )
}

/// JSON statistics summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub queue_depth: usize,
    pub queue_max_size: u32,
    pub worker_concurrency: usize,
    pub chat_backend: String,
}

/// `GET /v1/stats` - human-friendly counterpart to `/metrics`.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        queue_depth: state.queue.depth(),
        queue_max_size: state.queue.config().max_size,
        worker_concurrency: state.config.worker.concurrency,
        chat_backend: state.gateway.chat_backend_name().to_string(),
    })
}
