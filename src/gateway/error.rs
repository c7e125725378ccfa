//! Error types for gateway operations.

use thiserror::Error;

/// Errors surfaced by the AI provider gateway.
///
/// The worker retries `Unavailable` and `Timeout` a bounded number of
/// times; the remaining variants indicate configuration or contract
/// problems and fail the check immediately.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No client configured, connection refused, or backend 5xx.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline.
    #[error("Provider timeout after {0}ms")]
    Timeout(u64),

    /// Backend rejected the call for quota/billing reasons.
    #[error("Provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A chat request was routed to a model that cannot chat (or vice
    /// versa). Detected via model-name heuristics and backend error text.
    #[error("Provider model mismatch: {0}")]
    ModelMismatch(String),

    /// Backend returned a malformed or empty completion.
    #[error("Bad provider response: {0}")]
    BadResponse(String),
}

impl GatewayError {
    /// Whether the worker may retry this failure with the same input.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_) | GatewayError::Timeout(_))
    }
}
