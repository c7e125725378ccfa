//! In-process mock backend for tests and offline development.

use super::types::{ChatRequest, RawResponse};
use super::{GatewayError, ProviderBackend};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

/// Phrases the demo mock flags, with the rewording it applies.
const DEMO_RULES: &[(&str, &str, &str)] = &[
    ("驚異的な効果", "うれしい変化", "効能効果の著しい保証表現にあたります"),
    ("必ず痩せる", "すっきりを目指す", "効果を断定する表現は認められません"),
    ("完治", "健康維持をサポート", "医薬品的な効能効果の標ぼうにあたります"),
    ("治る", "すこやかに保つ", "医薬品的な効能効果の標ぼうにあたります"),
    ("副作用なし", "毎日お使いいただけます", "安全性を保証する表現は認められません"),
];

enum Behavior {
    /// Deterministic compliance reply: scan for known phrases, report
    /// each as a violation with char offsets, tool-call shape.
    Demo,
    /// Always reply with this exact free text.
    Text(String),
    /// Fail `fail_times` calls with Unavailable, then behave as Demo.
    Flaky { fail_times: u32 },
}

/// Backend that answers without any network I/O.
///
/// Activated by the `mock = true` provider flag; also the workhorse of
/// the pipeline and API tests, where real inference would be flaky and
/// slow. Replies are a pure function of the last user message (plus the
/// call counter for the flaky variant), so assertions stay exact.
pub struct MockBackend {
    behavior: Behavior,
    calls: AtomicU32,
}

impl MockBackend {
    /// Mock that performs a miniature compliance check over a fixed
    /// phrase list and reports a tool call the extractor parses strictly.
    pub fn compliance_demo() -> Self {
        Self {
            behavior: Behavior::Demo,
            calls: AtomicU32::new(0),
        }
    }

    /// Mock that always replies with the given free text.
    pub fn text(reply: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Text(reply.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Mock whose first `fail_times` calls fail with a transient error.
    pub fn flaky(fail_times: u32) -> Self {
        Self {
            behavior: Behavior::Flaky { fail_times },
            calls: AtomicU32::new(0),
        }
    }

    /// How many chat completions have been attempted.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn demo_reply(request: &ChatRequest) -> RawResponse {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        // The user message ends with instructions, a blank line, then the
        // ad copy itself; offsets must be computed against the copy alone.
        let input = prompt.rsplit("\n\n").next().unwrap_or(prompt);

        let mut modified = input.to_string();
        let mut violations = Vec::new();

        for (phrase, replacement, reason) in DEMO_RULES {
            if let Some(byte_pos) = input.find(phrase) {
                let start = input[..byte_pos].chars().count();
                let end = start + phrase.chars().count();
                violations.push(serde_json::json!({
                    "start_pos": start,
                    "end_pos": end,
                    "reason": reason,
                }));
                modified = modified.replace(phrase, replacement);
            }
        }

        let arguments = serde_json::json!({
            "modified": modified,
            "violations": violations,
        });

        RawResponse::ToolCall {
            name: "report_compliance_check".to_string(),
            arguments: arguments.to_string(),
        }
    }
}

#[async_trait]
impl ProviderBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Demo => Ok(Self::demo_reply(request)),
            Behavior::Text(reply) => Ok(RawResponse::Text(reply.clone())),
            Behavior::Flaky { fail_times } => {
                if call < *fail_times {
                    Err(GatewayError::Unavailable(
                        "mock backend simulated outage".to_string(),
                    ))
                } else {
                    Ok(Self::demo_reply(request))
                }
            }
        }
    }

    async fn embedding(&self, _model: &str, input: &str) -> Result<Vec<f32>, GatewayError> {
        // Deterministic short vector derived from char counts; the
        // gateway pads or truncates it to the configured dimensionality.
        let chars = input.chars().count() as f32;
        Ok((0..8).map(|i| (chars + i as f32) / 100.0).collect())
    }
}
