//! AI provider gateway.
//!
//! Presents one chat-completion and one embedding operation regardless of
//! which backend service is active, and translates backend-specific
//! failures into the [`GatewayError`] taxonomy. Provider selection is a
//! pure function of static configuration: backends are constructed once at
//! startup and injected; the gateway never switches providers per call.

pub mod error;
pub mod factory;
pub mod lmstudio;
pub mod mock;
pub mod openai;
pub mod openrouter;
pub mod types;

pub use error::GatewayError;
pub use factory::build_gateway;
pub use mock::MockBackend;
pub use types::{ChatMessage, ChatOptions, ChatRequest, RawResponse, ToolSpec};

use async_trait::async_trait;
use std::sync::Arc;

/// Unified interface for one LLM backend service.
///
/// Encapsulates the backend's HTTP protocol, response parsing, and error
/// mapping. Object-safe: used as `Arc<dyn ProviderBackend>` shared across
/// worker tasks. Implementations hold no mutable state after construction.
#[async_trait]
pub trait ProviderBackend: Send + Sync + 'static {
    /// Backend identifier for logging (e.g., "openai", "lmstudio").
    fn name(&self) -> &str;

    /// Whether this backend reliably honors function/tool declarations.
    /// When false the gateway strips tools from the request and callers
    /// must expect free-text replies.
    fn supports_tool_calls(&self) -> bool {
        true
    }

    /// Execute a chat completion.
    ///
    /// # Returns
    ///
    /// - `Ok(RawResponse::ToolCall)` when the backend produced a function call
    /// - `Ok(RawResponse::Text)` for free-text replies
    /// - `Err(GatewayError::*)` per the taxonomy in [`error`]
    async fn chat_completion(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError>;

    /// Generate an embedding vector for one input text.
    ///
    /// Default implementation reports the capability as unavailable.
    async fn embedding(&self, _model: &str, _input: &str) -> Result<Vec<f32>, GatewayError> {
        Err(GatewayError::Unavailable(format!(
            "{} backend does not provide embeddings",
            self.name()
        )))
    }
}

/// Process-scoped gateway over the active chat and embedding backends.
///
/// Constructed once at startup (see [`build_gateway`]) and shared by
/// reference; holds only immutable configuration and backend handles.
pub struct Gateway {
    chat: Arc<dyn ProviderBackend>,
    embed: Arc<dyn ProviderBackend>,
    chat_model: String,
    embedding_model: String,
    embedding_dimensions: usize,
}

impl Gateway {
    pub fn new(
        chat: Arc<dyn ProviderBackend>,
        embed: Arc<dyn ProviderBackend>,
        chat_model: String,
        embedding_model: String,
        embedding_dimensions: usize,
    ) -> Self {
        Self {
            chat,
            embed,
            chat_model,
            embedding_model,
            embedding_dimensions,
        }
    }

    /// Name of the active chat backend, for logging and error messages.
    pub fn chat_backend_name(&self) -> &str {
        self.chat.name()
    }

    /// Whether callers can expect structured tool-call replies.
    pub fn supports_tool_calls(&self) -> bool {
        self.chat.supports_tool_calls()
    }

    /// Execute a chat completion against the active backend.
    ///
    /// Tool declarations are dropped for backends that do not support
    /// them; the caller sees the divergence through the [`RawResponse`]
    /// variant and hands it to the response extractor.
    pub async fn create_chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolSpec>>,
        options: ChatOptions,
    ) -> Result<RawResponse, GatewayError> {
        if model_looks_like_embedding(&self.chat_model) {
            return Err(GatewayError::ModelMismatch(format!(
                "chat model '{}' looks like an embedding model; fix the provider configuration",
                self.chat_model
            )));
        }

        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages,
            tools,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        self.chat.chat_completion(&request).await
    }

    /// Generate an embedding, fitted to the configured dimensionality.
    ///
    /// A backend returning a vector of a different length is padded with
    /// zeros or truncated — a length mismatch alone is never an error.
    pub async fn create_embedding(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
        let mut vector = self.embed.embedding(&self.embedding_model, input).await?;
        fit_dimension(&mut vector, self.embedding_dimensions);
        Ok(vector)
    }
}

/// Name heuristic for misrouted chat requests.
pub(crate) fn model_looks_like_embedding(model: &str) -> bool {
    let name = model.to_lowercase();
    name.contains("embed")
}

/// Pad with zeros or truncate to the target dimensionality.
pub(crate) fn fit_dimension(vector: &mut Vec<f32>, target: usize) {
    if vector.len() > target {
        vector.truncate(target);
    } else {
        vector.resize(target, 0.0);
    }
}

/// Map a reqwest transport error to the gateway taxonomy.
pub(crate) fn map_transport_error(err: reqwest::Error, timeout_ms: u64) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout_ms)
    } else {
        GatewayError::Unavailable(err.to_string())
    }
}

/// Classify a non-success HTTP status plus error body.
pub(crate) fn classify_error_body(status: u16, body: &str) -> GatewayError {
    let lowered = body.to_lowercase();

    if status == 429 || lowered.contains("insufficient_quota") || lowered.contains("quota") {
        return GatewayError::QuotaExceeded(format!("{}: {}", status, body));
    }

    // Backends word this differently; match the fragments seen in practice.
    if lowered.contains("not a chat model")
        || lowered.contains("is not supported in the v1/chat/completions")
        || lowered.contains("embedding model")
    {
        return GatewayError::ModelMismatch(format!("{}: {}", status, body));
    }

    if status >= 500 {
        return GatewayError::Unavailable(format!("{}: {}", status, body));
    }

    GatewayError::BadResponse(format!("{}: {}", status, body))
}
