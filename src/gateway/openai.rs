//! OpenAI backend implementation.

use super::types::{wire_request_body, ChatRequest, RawResponse, WireCompletion, WireEmbeddingResponse};
use super::{classify_error_body, map_transport_error, GatewayError, ProviderBackend};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI cloud backend.
///
/// Chat completion via POST /v1/chat/completions with Bearer
/// authentication, embeddings via POST /v1/embeddings. Function calling
/// is supported, so the worker can rely on structured replies.
pub struct OpenAIBackend {
    /// Base URL (e.g., "https://api.openai.com")
    base_url: String,
    /// API key for Bearer authentication; absent means unconfigured.
    api_key: Option<String>,
    /// Per-call deadline.
    timeout: Duration,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl OpenAIBackend {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
        client: Arc<Client>,
    ) -> Self {
        Self {
            base_url,
            api_key,
            timeout,
            client,
        }
    }

    fn bearer(&self) -> Result<String, GatewayError> {
        self.api_key
            .as_ref()
            .map(|k| format!("Bearer {}", k))
            .ok_or_else(|| {
                GatewayError::Unavailable(
                    "OpenAI API key is not configured (set OPENAI_API_KEY)".to_string(),
                )
            })
    }
}

#[async_trait]
impl ProviderBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let auth = self.bearer()?;
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .header("authorization", auth)
            .json(&wire_request_body(request, true))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_error_body(status.as_u16(), &body));
        }

        let completion: WireCompletion = response.json().await.map_err(|e| {
            GatewayError::BadResponse(format!("Failed to parse completion response: {}", e))
        })?;

        completion.into_raw()
    }

    async fn embedding(&self, model: &str, input: &str) -> Result<Vec<f32>, GatewayError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let auth = self.bearer()?;
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .header("authorization", auth)
            .json(&serde_json::json!({ "model": model, "input": input }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_error_body(status.as_u16(), &body));
        }

        let parsed: WireEmbeddingResponse = response.json().await.map_err(|e| {
            GatewayError::BadResponse(format!("Failed to parse embedding response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| GatewayError::BadResponse("embedding response had no data".into()))
    }
}
