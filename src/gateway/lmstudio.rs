//! LM Studio backend implementation.

use super::types::{wire_request_body, ChatRequest, RawResponse, WireCompletion, WireEmbeddingResponse};
use super::{classify_error_body, map_transport_error, GatewayError, ProviderBackend};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Local LM Studio backend.
///
/// Speaks the OpenAI-compatible protocol on localhost without
/// authentication. Local models do not honor function declarations
/// reliably, so tool declarations are stripped from the request and the
/// reply always comes back as free text for the extractor's fallback
/// chain. Timeouts are much longer than the cloud backends because
/// inference runs on whatever hardware the operator has.
pub struct LMStudioBackend {
    /// Base URL (e.g., "http://localhost:1234")
    base_url: String,
    timeout: Duration,
    client: Arc<Client>,
}

impl LMStudioBackend {
    pub fn new(base_url: String, timeout: Duration, client: Arc<Client>) -> Self {
        Self {
            base_url,
            timeout,
            client,
        }
    }
}

#[async_trait]
impl ProviderBackend for LMStudioBackend {
    fn name(&self) -> &str {
        "lmstudio"
    }

    fn supports_tool_calls(&self) -> bool {
        false
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .json(&wire_request_body(request, false))
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
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
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
