//! Check submission and retrieval handlers.

use super::types::{ApiError, CheckView, SubmitCheckRequest, SubmitCheckResponse};
use super::AppState;
use crate::pipeline::CheckJob;
use crate::realtime::CheckEvent;
use crate::store::Check;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// `POST /v1/checks`
///
/// Validation happens before anything is persisted; only a check that
/// passed validation can ever occupy a queue slot. An enqueue failure
/// still marks the just-created check failed so the client never sees a
/// pending check that no worker will pick up.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitCheckRequest>,
) -> Result<(StatusCode, Json<SubmitCheckResponse>), ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::unauthorized("ユーザーIDが指定されていません"));
    }
    if !state
        .directory
        .is_member(&request.user_id, &request.organization_id)
    {
        return Err(ApiError::forbidden(
            "この組織のチェックを実行する権限がありません",
        ));
    }

    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request(
            "チェック対象のテキストが空です",
            Some("text"),
        ));
    }
    let char_count = request.text.chars().count();
    let max_chars = state.config.worker.max_input_chars;
    if char_count > max_chars {
        return Err(ApiError::bad_request(
            &format!(
                "テキストが長すぎます({}文字)。上限は{}文字です",
                char_count, max_chars
            ),
            Some("text"),
        ));
    }

    let check = Check::new(
        request.organization_id.clone(),
        request.user_id.clone(),
        request.text.clone(),
        request.input_type,
        request.file_name.clone(),
    );
    let check_id = check.id.clone();
    let status = check.status;

    state.store.create_check(check).await.map_err(|e| {
        error!(error = %e, "Failed to persist new check");
        ApiError::service_unavailable("チェックを保存できませんでした")
    })?;

    let job = CheckJob {
        check_id: check_id.clone(),
        organization_id: request.organization_id,
        text: request.text,
        priority: request.priority,
        input_type: request.input_type,
    };
    if let Err(e) = state.queue.enqueue(job) {
        warn!(check_id = %check_id, error = %e, "Enqueue failed; marking check failed");
        let message = "チェックキューが混み合っています。しばらくしてから再度お試しください。";
        if let Err(store_err) = state.store.fail_check(&check_id, message.to_string()).await {
            error!(check_id = %check_id, error = %store_err, "Failed to mark check failed after enqueue error");
        }
        state
            .events
            .publish(&check_id, CheckEvent::Failed { error: message.to_string() });
        return Err(ApiError::service_unavailable(message));
    }

    info!(check_id = %check_id, chars = char_count, priority = ?request.priority, "Check queued");
    state.events.publish(&check_id, CheckEvent::Queued);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitCheckResponse {
            id: check_id,
            status,
        }),
    ))
}

/// `GET /v1/checks/{id}` - polling fallback for clients without SSE.
pub async fn get_check(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckView>, ApiError> {
    let record = state.store.get_check(&id).await.map_err(|e| {
        error!(check_id = %id, error = %e, "Store read failed");
        ApiError::service_unavailable("チェックを読み込めませんでした")
    })?;

    match record {
        Some((check, violations)) => Ok(Json(CheckView::from_record(check, violations))),
        None => Err(ApiError::not_found(&id)),
    }
}

/// `DELETE /v1/checks/{id}` - soft delete; the record survives for audit.
pub async fn delete_check(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.store.soft_delete(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(crate::store::StoreError::NotFound(_)) => Err(ApiError::not_found(&id)),
        Err(e) => {
            error!(check_id = %id, error = %e, "Soft delete failed");
            Err(ApiError::service_unavailable(
                "チェックを削除できませんでした",
            ))
        }
    }
}
