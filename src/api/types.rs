//! HTTP request/response types for the check API.
//!
//! The JSON surface is camelCase; the store stays snake_case. Errors use
//! one envelope shape with a machine-readable code that maps to the HTTP
//! status.

use crate::pipeline::Priority;
use crate::store::{Check, CheckStatus, InputType, Violation};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/checks`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckRequest {
    pub text: String,
    pub user_id: String,
    pub organization_id: String,
    #[serde(default)]
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// High-priority checks are dequeued ahead of waiting normal ones.
    #[serde(default)]
    pub priority: Priority,
}

/// Response to a successful submission (202 Accepted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCheckResponse {
    pub id: String,
    pub status: CheckStatus,
}

/// One check as read through `GET /v1/checks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckView {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub original_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_text: Option<String>,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub violations: Vec<ViolationView>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CheckView {
    pub fn from_record(check: Check, violations: Vec<Violation>) -> Self {
        Self {
            id: check.id,
            organization_id: check.organization_id,
            user_id: check.user_id,
            original_text: check.original_text,
            modified_text: check.modified_text,
            status: check.status,
            error_message: check.error_message,
            input_type: check.input_type,
            file_name: check.file_name,
            violations: violations.into_iter().map(ViolationView::from).collect(),
            created_at: check.created_at,
            completed_at: check.completed_at,
        }
    }
}

/// One violation span in API shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationView {
    pub id: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_id: Option<String>,
}

impl From<Violation> for ViolationView {
    fn from(v: Violation) -> Self {
        Self {
            id: v.id,
            start_pos: v.start_pos,
            end_pos: v.end_pos,
            reason: v.reason,
            dictionary_id: v.dictionary_id,
        }
    }
}

/// API error response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    fn build(message: &str, r#type: &str, code: &str, param: Option<&str>) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: r#type.to_string(),
                param: param.map(str::to_string),
                code: Some(code.to_string()),
            },
        }
    }

    /// Create a bad request error (400).
    pub fn bad_request(message: &str, param: Option<&str>) -> Self {
        Self::build(
            message,
            "invalid_request_error",
            "invalid_request_error",
            param,
        )
    }

    /// Create an unauthorized error (401).
    pub fn unauthorized(message: &str) -> Self {
        Self::build(message, "authentication_error", "unauthorized", None)
    }

    /// Create a forbidden error (403).
    pub fn forbidden(message: &str) -> Self {
        Self::build(message, "permission_error", "forbidden", None)
    }

    /// Create a not found error (404).
    pub fn not_found(id: &str) -> Self {
        Self::build(
            &format!("Check '{}' not found", id),
            "invalid_request_error",
            "not_found",
            Some("id"),
        )
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: &str) -> Self {
        Self::build(message, "server_error", "service_unavailable", None)
    }

    /// Create a bad gateway error (502).
    pub fn bad_gateway(message: &str) -> Self {
        Self::build(message, "server_error", "bad_gateway", None)
    }

    /// Create a gateway timeout error (504).
    pub fn gateway_timeout(message: &str) -> Self {
        Self::build(message, "server_error", "gateway_timeout", None)
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("unauthorized") => StatusCode::UNAUTHORIZED,
            Some("forbidden") => StatusCode::FORBIDDEN,
            Some("not_found") => StatusCode::NOT_FOUND,
            Some("bad_gateway") => StatusCode::BAD_GATEWAY,
            Some("gateway_timeout") => StatusCode::GATEWAY_TIMEOUT,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
