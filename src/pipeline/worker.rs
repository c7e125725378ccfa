//! Check-processing worker pool.
//!
//! Workers pull jobs off the [`CheckQueue`], claim the check exclusively
//! through the store, run the gateway and extractor, and write the
//! terminal result. Every state change is mirrored to the realtime hub.

use super::prompt;
use super::queue::{CheckJob, CheckQueue};
use crate::config::WorkerConfig;
use crate::dictionary::DictionaryLookup;
use crate::extractor::{self, ExtractError};
use crate::gateway::{ChatOptions, Gateway, GatewayError, RawResponse};
use crate::realtime::{CheckEvent, CheckEvents};
use crate::store::{CheckStore, Violation};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything a worker needs, shared across the pool.
pub struct WorkerContext {
    pub store: Arc<dyn CheckStore>,
    pub dictionary: Arc<dyn DictionaryLookup>,
    pub gateway: Arc<Gateway>,
    pub events: Arc<CheckEvents>,
    pub queue: Arc<CheckQueue>,
    pub config: WorkerConfig,
}

/// Spawn the worker pool.
///
/// Each worker loops on the shared queue until cancellation. In-flight
/// checks finish; checks still queued at shutdown stay `pending` and are
/// picked up on restart (or surface through polling as stuck-pending,
/// which operators can re-submit).
pub fn start_workers(ctx: Arc<WorkerContext>, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
    let concurrency = ctx.config.concurrency.max(1);
    info!(concurrency, "Starting check workers");

    (0..concurrency)
        .map(|worker_id| {
            let ctx = ctx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                debug!(worker_id, "Worker started");
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(worker_id, "Worker shutting down");
                            break;
                        }
                        job = ctx.queue.dequeue() => {
                            match job {
                                Some(job) => process_check(&ctx, &job).await,
                                None => break,
                            }
                        }
                    }
                }
            })
        })
        .collect()
}

/// Run one check end to end.
///
/// Public so integration tests can drive the pipeline without spawning
/// the pool.
pub async fn process_check(ctx: &WorkerContext, job: &CheckJob) {
    let started = Instant::now();

    // Exclusive claim; a false return means another worker got there
    // first or the check is already terminal.
    match ctx.store.claim_processing(&job.check_id).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(check_id = %job.check_id, "Check not claimable; skipping");
            return;
        }
        Err(e) => {
            error!(check_id = %job.check_id, error = %e, "Failed to claim check");
            return;
        }
    }
    ctx.events.publish(&job.check_id, CheckEvent::Processing);

    // Dictionary context is best-effort: a failing lookup degrades the
    // prompt, never the check.
    let candidates = match ctx.dictionary.search(&job.text, &job.organization_id).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(check_id = %job.check_id, error = %e, "Dictionary lookup failed; proceeding without candidates");
            Vec::new()
        }
    };

    let raw = match call_gateway(ctx, job, &candidates).await {
        Ok(raw) => raw,
        Err(e) => {
            metrics::counter!("yakulint_checks_failed_total").increment(1);
            fail(ctx, &job.check_id, gateway_failure_message(&e)).await;
            return;
        }
    };

    let outcome = match extractor::extract(&raw, &job.text) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(check_id = %job.check_id, error = %e, "Response extraction failed");
            metrics::counter!("yakulint_checks_failed_total").increment(1);
            fail(ctx, &job.check_id, extract_failure_message(&e)).await;
            return;
        }
    };

    let violations: Vec<Violation> = outcome
        .violations
        .into_iter()
        .map(|span| Violation {
            id: uuid::Uuid::new_v4().to_string(),
            check_id: job.check_id.clone(),
            start_pos: span.start_pos,
            end_pos: span.end_pos,
            reason: span.reason,
            dictionary_id: span.dictionary_id,
        })
        .collect();

    match ctx
        .store
        .complete_check(&job.check_id, outcome.modified.clone(), violations.clone())
        .await
    {
        Ok(()) => {
            info!(
                check_id = %job.check_id,
                violations = violations.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Check completed"
            );
            metrics::counter!("yakulint_checks_completed_total").increment(1);
            metrics::histogram!("yakulint_check_duration_seconds")
                .record(started.elapsed().as_secs_f64());
            ctx.events.publish(
                &job.check_id,
                CheckEvent::Completed {
                    modified_text: outcome.modified,
                    violations,
                },
            );
        }
        Err(e) => {
            error!(check_id = %job.check_id, error = %e, "Failed to persist completed check");
            metrics::counter!("yakulint_checks_failed_total").increment(1);
            fail(
                ctx,
                &job.check_id,
                "チェック結果の保存に失敗しました。".to_string(),
            )
            .await;
        }
    }
}

/// Gateway call with bounded retries for transient failures only.
async fn call_gateway(
    ctx: &WorkerContext,
    job: &CheckJob,
    candidates: &[crate::dictionary::PhraseCandidate],
) -> Result<RawResponse, GatewayError> {
    let messages = prompt::build_messages(&job.text, candidates);
    let tools = ctx
        .gateway
        .supports_tool_calls()
        .then(|| vec![prompt::report_tool()]);
    let options = ChatOptions {
        temperature: ctx.config.temperature,
        max_tokens: ctx.config.max_output_tokens,
    };

    let mut attempt = 0u32;
    loop {
        match ctx
            .gateway
            .create_chat_completion(messages.clone(), tools.clone(), options)
            .await
        {
            Ok(raw) => return Ok(raw),
            Err(e) if e.is_transient() && attempt < ctx.config.max_retries => {
                attempt += 1;
                warn!(
                    check_id = %job.check_id,
                    attempt,
                    max_retries = ctx.config.max_retries,
                    error = %e,
                    "Transient gateway failure; retrying"
                );
                metrics::counter!("yakulint_check_retries_total").increment(1);
                tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fail(ctx: &WorkerContext, check_id: &str, message: String) {
    if let Err(e) = ctx.store.fail_check(check_id, message.clone()).await {
        error!(check_id, error = %e, "Failed to persist failed check");
    }
    ctx.events
        .publish(check_id, CheckEvent::Failed { error: message });
}

/// User-facing Japanese failure message for a gateway error.
fn gateway_failure_message(error: &GatewayError) -> String {
    match error {
        GatewayError::Unavailable(_) => {
            "AIサービスに接続できませんでした。プロバイダが起動しているか確認してください。"
        }
        GatewayError::Timeout(_) => {
            "AIサービスの応答がタイムアウトしました。時間をおいて再度お試しください。"
        }
        GatewayError::QuotaExceeded(_) => {
            "AIサービスの利用上限に達しました。プランと請求情報を確認してください。"
        }
        GatewayError::ModelMismatch(_) => {
            "AIモデルの設定に誤りがあります。チャット用モデルが設定されているか確認してください。"
        }
        GatewayError::BadResponse(_) => "AIサービスから不正な応答が返されました。",
    }
    .to_string()
}

fn extract_failure_message(error: &ExtractError) -> String {
    match error {
        ExtractError::Parse(_) => "AIの応答からチェック結果を読み取れませんでした。",
        ExtractError::InvalidShape(_) => "AIの応答の形式が想定と異なります。",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::dictionary::StaticDictionary;
    use crate::gateway::MockBackend;
    use crate::store::{Check, CheckStatus, InputType, MemoryCheckStore};

    fn make_context(backend: Arc<MockBackend>, max_retries: u32) -> WorkerContext {
        WorkerContext {
            store: Arc::new(MemoryCheckStore::new()),
            dictionary: Arc::new(StaticDictionary::new()),
            gateway: Arc::new(Gateway::new(
                backend.clone(),
                backend,
                "mock-chat".to_string(),
                "mock-embedding".to_string(),
                8,
            )),
            events: CheckEvents::new(),
            queue: Arc::new(CheckQueue::new(QueueConfig::default())),
            config: WorkerConfig {
                max_retries,
                ..WorkerConfig::default()
            },
        }
    }

    async fn seed_check(ctx: &WorkerContext, text: &str) -> CheckJob {
        let check = Check::new(
            "org-1".to_string(),
            "user-1".to_string(),
            text.to_string(),
            InputType::Text,
            None,
        );
        let job = CheckJob {
            check_id: check.id.clone(),
            organization_id: check.organization_id.clone(),
            text: check.original_text.clone(),
            priority: crate::pipeline::queue::Priority::Normal,
            input_type: check.input_type,
        };
        ctx.store.create_check(check).await.unwrap();
        job
    }

    #[tokio::test]
    async fn completes_check_with_violations() {
        let ctx = make_context(Arc::new(MockBackend::compliance_demo()), 2);
        let job = seed_check(&ctx, "このサプリは驚異的な効果があります").await;

        process_check(&ctx, &job).await;

        let (check, violations) = ctx.store.get_check(&job.check_id).await.unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Completed);
        assert!(check.modified_text.unwrap().contains("うれしい変化"));
        assert!(check.completed_at.is_some());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].start_pos, 6);
        assert_eq!(violations[0].end_pos, 12);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_then_succeeds() {
        let backend = Arc::new(MockBackend::flaky(1));
        let ctx = make_context(backend.clone(), 2);
        let job = seed_check(&ctx, "必ず痩せるサプリ").await;

        process_check(&ctx, &job).await;

        let (check, _) = ctx.store.get_check(&job.check_id).await.unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Completed);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_with_connection_message() {
        let backend = Arc::new(MockBackend::flaky(10));
        let ctx = make_context(backend.clone(), 1);
        let job = seed_check(&ctx, "完治します").await;

        process_check(&ctx, &job).await;

        let (check, violations) = ctx.store.get_check(&job.check_id).await.unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Failed);
        let message = check.error_message.unwrap();
        assert!(message.contains("接続"));
        assert!(message.contains("起動"));
        assert!(violations.is_empty());
        // initial attempt + one retry
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn free_text_reply_goes_through_heuristics() {
        let backend = Arc::new(MockBackend::text(
            "「完治」を「健康維持をサポート」に変更してください",
        ));
        let ctx = make_context(backend, 0);
        let job = seed_check(&ctx, "飲めば完治します").await;

        process_check(&ctx, &job).await;

        let (check, violations) = ctx.store.get_check(&job.check_id).await.unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Completed);
        assert_eq!(
            check.modified_text.unwrap(),
            "飲めば健康維持をサポートします"
        );
        assert_eq!(violations.len(), 1);
    }

    #[tokio::test]
    async fn already_claimed_check_is_skipped() {
        let ctx = make_context(Arc::new(MockBackend::compliance_demo()), 0);
        let job = seed_check(&ctx, "治ると評判").await;

        // Simulate another worker holding the claim.
        assert!(ctx.store.claim_processing(&job.check_id).await.unwrap());

        process_check(&ctx, &job).await;

        let (check, _) = ctx.store.get_check(&job.check_id).await.unwrap().unwrap();
        assert_eq!(check.status, CheckStatus::Processing);
    }

    #[tokio::test]
    async fn events_follow_the_lifecycle() {
        let ctx = make_context(Arc::new(MockBackend::compliance_demo()), 0);
        let job = seed_check(&ctx, "副作用なしで安心").await;
        let mut sub = ctx.events.subscribe(&job.check_id);

        process_check(&ctx, &job).await;

        assert_eq!(sub.next_event().await, Some(CheckEvent::Processing));
        match sub.next_event().await {
            Some(CheckEvent::Completed { violations, .. }) => {
                assert_eq!(violations.len(), 1);
            }
            other => panic!("expected completed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn worker_pool_drains_the_queue() {
        let ctx = Arc::new(make_context(Arc::new(MockBackend::compliance_demo()), 0));
        let cancel = CancellationToken::new();
        let handles = start_workers(ctx.clone(), cancel.clone());

        let mut job_ids = Vec::new();
        for _ in 0..5 {
            let job = seed_check(&ctx, "驚異的な効果のサプリ").await;
            job_ids.push(job.check_id.clone());
            ctx.queue.enqueue(job).unwrap();
        }

        // Wait for all checks to reach a terminal state.
        for _ in 0..100 {
            let mut done = 0;
            for id in &job_ids {
                let (check, _) = ctx.store.get_check(id).await.unwrap().unwrap();
                if check.status.is_terminal() {
                    done += 1;
                }
            }
            if done == job_ids.len() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        for id in &job_ids {
            let (check, _) = ctx.store.get_check(id).await.unwrap().unwrap();
            assert_eq!(check.status, CheckStatus::Completed);
        }

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
