//! End-to-end tests for the check API: submission, validation,
//! authorization, polling, deletion, and the observability routes.

mod common;

use axum::http::StatusCode;
use common::*;
use std::sync::Arc;
use tower::Service;
use yakulint::config::QueueConfig;
use yakulint::store::{CheckStatus, CheckStore, MemoryDirectory};

#[tokio::test]
async fn submit_accepts_and_worker_completes() {
    let harness = TestHarness::with_defaults();
    let cancel = harness.spawn_workers();
    let mut app = harness.app.clone();

    let response = app
        .call(submit_request("このサプリは驚異的な効果があります"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    let check_id = body["id"].as_str().unwrap().to_string();

    let check = harness.wait_for_terminal(&check_id).await;
    assert_eq!(check.status, CheckStatus::Completed);

    // Polling view carries the rewritten text and the violation spans
    let response = app
        .call(get_request(&format!("/v1/checks/{}", check_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["status"], "completed");
    assert_eq!(view["modifiedText"], "このサプリはうれしい変化があります");
    let violations = view["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["startPos"], 6);
    assert_eq!(violations[0]["endPos"], 12);
    assert!(violations[0]["reason"].as_str().unwrap().contains("効果"));

    cancel.cancel();
}

#[tokio::test]
async fn submit_without_user_is_unauthorized() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app
        .call(submit_request_for("広告文", "", "org-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");
    // Nothing was persisted or queued
    assert!(harness.store.is_empty());
    assert_eq!(harness.state.queue.depth(), 0);
}

#[tokio::test]
async fn submit_for_foreign_organization_is_forbidden() {
    let directory = Arc::new(MemoryDirectory::strict());
    directory.add_member("user-1", "org-1");
    let harness = HarnessBuilder::default().with_directory(directory).build();
    let mut app = harness.app.clone();

    let response = app
        .call(submit_request_for("広告文", "user-1", "org-2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn submit_member_of_strict_directory_is_accepted() {
    let directory = Arc::new(MemoryDirectory::strict());
    directory.add_member("user-1", "org-1");
    let harness = HarnessBuilder::default().with_directory(directory).build();
    let mut app = harness.app.clone();

    let response = app
        .call(submit_request_for("広告文です", "user-1", "org-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn submit_empty_text_is_rejected() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(submit_request("   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["param"], "text");
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn submit_over_length_text_is_rejected_before_persisting() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    // 10,001 multi-byte characters: the limit counts characters, not bytes
    let text = "あ".repeat(10_001);
    let response = app.call(submit_request(&text)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("10001文字"));
    assert!(harness.store.is_empty());
    assert_eq!(harness.state.queue.depth(), 0);
}

#[tokio::test]
async fn submit_text_at_exact_limit_is_accepted() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let text = "あ".repeat(10_000);
    let response = app.call(submit_request(&text)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn high_priority_submission_is_picked_up_first() {
    // No workers, so submission order is frozen in the queue
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(submit_request("通常の広告文")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .call(submit_priority_request("至急確認したい広告文", "high"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let high_id = body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // The later high-priority check comes off the queue before the
    // earlier normal one
    let first = harness.ctx.queue.dequeue().await.unwrap();
    assert_eq!(first.check_id, high_id);
    let second = harness.ctx.queue.dequeue().await.unwrap();
    assert_ne!(second.check_id, high_id);
}

#[tokio::test]
async fn full_queue_fails_submission_and_marks_check_failed() {
    // One slot, no workers draining
    let harness = HarnessBuilder::default()
        .with_queue_config(QueueConfig {
            enabled: true,
            max_size: 1,
        })
        .build();
    let mut app = harness.app.clone();

    let response = app.call(submit_request("一件目の広告文")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let first_id = body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app.call(submit_request("二件目の広告文")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("混み合っています"));

    // The rejected check was still persisted, as failed, so a client that
    // lost the submission response sees what happened when it polls
    let ids = harness.store.ids();
    assert_eq!(ids.len(), 2);
    let second_id = ids.into_iter().find(|id| *id != first_id).unwrap();
    let (second, _) = harness.store.get_check(&second_id).await.unwrap().unwrap();
    assert_eq!(second.status, CheckStatus::Failed);
    assert!(second.error_message.unwrap().contains("混み合っています"));

    // The first check is untouched
    let (first, _) = harness.store.get_check(&first_id).await.unwrap().unwrap();
    assert_eq!(first.status, CheckStatus::Pending);
}

#[tokio::test]
async fn get_unknown_check_is_not_found() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app
        .call(get_request("/v1/checks/no-such-check"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["param"], "id");
}

#[tokio::test]
async fn delete_hides_check_from_reads() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(submit_request("削除対象の広告文")).await.unwrap();
    let check_id = body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .call(delete_request(&format!("/v1/checks/{}", check_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .call(get_request(&format!("/v1/checks/{}", check_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .call(delete_request("/v1/checks/no-such-check"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_queue_and_backend() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["chat_backend"], "mock");
    assert_eq!(body["queue_max_size"], 200);
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn stats_endpoint_reports_configuration() {
    let harness = TestHarness::with_defaults();
    let mut app = harness.app.clone();

    let response = app.call(get_request("/v1/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["queue_depth"], 0);
    assert_eq!(body["queue_max_size"], 200);
    assert_eq!(body["worker_concurrency"], 4);
    assert_eq!(body["chat_backend"], "mock");
}
