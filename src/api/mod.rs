//! # Check API
//!
//! HTTP endpoints for submitting compliance checks and observing their
//! progress.
//!
//! ## Endpoints
//!
//! - `POST /v1/checks` - Submit ad copy for checking (async, 202)
//! - `GET /v1/checks/{id}` - Fetch a check with violations (polling)
//! - `DELETE /v1/checks/{id}` - Soft-delete a check
//! - `GET /v1/checks/{id}/events` - SSE stream of progress events
//! - `GET /health` - Liveness plus queue and backend summary
//! - `GET /metrics` - Prometheus text format metrics
//! - `GET /v1/stats` - JSON statistics
//!
//! ## Error Handling
//!
//! All errors use one JSON envelope:
//! ```json
//! {
//!   "error": {
//!     "message": "Check 'abc' not found",
//!     "type": "invalid_request_error",
//!     "param": "id",
//!     "code": "not_found"
//!   }
//! }
//! ```

mod checks;
mod health;
mod stream;
pub mod types;

pub use types::*;

use crate::config::YakulintConfig;
use crate::gateway::Gateway;
use crate::metrics::MetricsCollector;
use crate::pipeline::CheckQueue;
use crate::realtime::CheckEvents;
use crate::store::{CheckStore, Directory};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub store: Arc<dyn CheckStore>,
    pub directory: Arc<dyn Directory>,
    pub queue: Arc<CheckQueue>,
    pub events: Arc<CheckEvents>,
    pub gateway: Arc<Gateway>,
    pub config: Arc<YakulintConfig>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    /// Create new application state around the pipeline collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<YakulintConfig>,
        store: Arc<dyn CheckStore>,
        directory: Arc<dyn Directory>,
        queue: Arc<CheckQueue>,
        events: Arc<CheckEvents>,
        gateway: Arc<Gateway>,
    ) -> Self {
        let start_time = Instant::now();

        // Initialize metrics (safe to call multiple times; tests that have
        // already installed a recorder get a detached handle instead)
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });

        let metrics_collector = Arc::new(MetricsCollector::new(start_time, prometheus_handle));

        Self {
            store,
            directory,
            queue,
            events,
            gateway,
            config,
            start_time,
            metrics_collector,
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        .route("/v1/checks", post(checks::submit))
        .route("/v1/checks/:id", get(checks::get_check))
        .route("/v1/checks/:id", delete(checks::delete_check))
        .route("/v1/checks/:id/events", get(stream::events))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/v1/stats", get(crate::metrics::handler::stats_handler))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
