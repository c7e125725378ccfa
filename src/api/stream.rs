//! SSE stream of check progress events.

use super::types::ApiError;
use super::AppState;
use crate::realtime::CheckEvent;
use crate::store::CheckStatus;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;

/// `GET /v1/checks/{id}/events`
///
/// The subscription is opened before the snapshot read, so any event
/// published between the two is buffered rather than lost. The snapshot
/// is always emitted first; live events follow until a terminal event
/// closes the stream. Clients that miss events (or never connect) fall
/// back to polling `GET /v1/checks/{id}`.
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let mut subscription = state.events.subscribe(&id);

    let record = state.store.get_check(&id).await.map_err(|e| {
        error!(check_id = %id, error = %e, "Store read failed");
        ApiError::service_unavailable("チェックを読み込めませんでした")
    })?;
    let (check, violations) = record.ok_or_else(|| ApiError::not_found(&id))?;

    let snapshot = match check.status {
        CheckStatus::Pending => CheckEvent::Queued,
        CheckStatus::Processing => CheckEvent::Processing,
        CheckStatus::Completed => CheckEvent::Completed {
            modified_text: check.modified_text.unwrap_or_default(),
            violations,
        },
        CheckStatus::Failed => CheckEvent::Failed {
            error: check.error_message.unwrap_or_default(),
        },
    };

    let stream = async_stream::stream! {
        let terminal = snapshot.is_terminal();
        yield Ok(to_sse_event(&snapshot));
        if terminal {
            return;
        }

        while let Some(event) = subscription.next_event().await {
            let terminal = event.is_terminal();
            yield Ok(to_sse_event(&event));
            if terminal {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &CheckEvent) -> Event {
    match Event::default().event("check").json_data(event) {
        Ok(sse) => sse,
        // CheckEvent serialization cannot fail; keep the stream alive
        // with a delivery-error marker if it somehow does.
        Err(e) => {
            error!(error = %e, "Failed to serialize check event");
            Event::default()
                .event("check")
                .data(r#"{"type":"delivery_error"}"#)
        }
    }
}
