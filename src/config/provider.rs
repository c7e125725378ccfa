//! AI provider configuration
//!
//! Selects exactly one chat provider and one embedding provider for the
//! lifetime of the process. The selection is resolved once at startup; the
//! gateway never switches providers per request.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which backend service handles a given capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Openai,
    Openrouter,
    Lmstudio,
}

impl FromStr for ProviderKind {
    type Err = super::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::Openai),
            "openrouter" => Ok(ProviderKind::Openrouter),
            "lmstudio" => Ok(ProviderKind::Lmstudio),
            _ => Err(super::ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderKind::Openai => "openai",
            ProviderKind::Openrouter => "openrouter",
            ProviderKind::Lmstudio => "lmstudio",
        };
        f.write_str(s)
    }
}

/// Connection settings for one backend service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    /// Keys never appear in the config file itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    /// Per-call deadline in seconds.
    pub timeout_seconds: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key_env: None,
            chat_model: String::new(),
            embedding_model: String::new(),
            timeout_seconds: 60,
        }
    }
}

/// Provider selection plus per-backend settings.
///
/// Read once at process start and shared immutably afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Active chat-completion provider.
    pub chat: ProviderKind,
    /// Active embedding provider.
    pub embedding: ProviderKind,
    /// Fixed output dimensionality the gateway enforces on embeddings.
    pub embedding_dimensions: usize,
    /// When true, a canned in-process backend replaces real providers.
    pub mock: bool,
    pub openai: BackendSettings,
    pub openrouter: BackendSettings,
    pub lmstudio: BackendSettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chat: ProviderKind::Openai,
            embedding: ProviderKind::Openai,
            embedding_dimensions: 1536,
            mock: false,
            openai: BackendSettings {
                base_url: "https://api.openai.com".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                chat_model: "gpt-4o-mini".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
                timeout_seconds: 60,
            },
            openrouter: BackendSettings {
                base_url: "https://openrouter.ai/api".to_string(),
                api_key_env: Some("OPENROUTER_API_KEY".to_string()),
                chat_model: "openai/gpt-4o-mini".to_string(),
                embedding_model: "openai/text-embedding-3-small".to_string(),
                timeout_seconds: 60,
            },
            lmstudio: BackendSettings {
                base_url: "http://localhost:1234".to_string(),
                api_key_env: None,
                chat_model: "local-model".to_string(),
                embedding_model: "local-embedding".to_string(),
                // Local servers may cold-start a model on first call.
                timeout_seconds: 180,
            },
        }
    }
}

impl ProviderConfig {
    /// Settings for the given provider.
    pub fn settings(&self, kind: ProviderKind) -> &BackendSettings {
        match kind {
            ProviderKind::Openai => &self.openai,
            ProviderKind::Openrouter => &self.openrouter,
            ProviderKind::Lmstudio => &self.lmstudio,
        }
    }

    /// Resolve the API key for a provider from its configured env var.
    pub fn api_key(&self, kind: ProviderKind) -> Option<String> {
        self.settings(kind)
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty())
    }
}
