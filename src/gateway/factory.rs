//! Backend construction from static configuration.

use super::lmstudio::LMStudioBackend;
use super::mock::MockBackend;
use super::openai::OpenAIBackend;
use super::openrouter::OpenRouterBackend;
use super::{Gateway, ProviderBackend};
use crate::config::{ProviderConfig, ProviderKind};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the process-wide [`Gateway`] from the provider configuration.
///
/// Backends share one [`reqwest::Client`] for connection pooling. With
/// `mock = true` both capabilities route to the in-process mock and no
/// HTTP client is touched.
pub fn build_gateway(config: &ProviderConfig) -> Gateway {
    if config.mock {
        info!("Provider mock enabled; no external backend will be called");
        let backend: Arc<dyn ProviderBackend> = Arc::new(MockBackend::compliance_demo());
        return Gateway::new(
            backend.clone(),
            backend,
            "mock-chat".to_string(),
            "mock-embedding".to_string(),
            config.embedding_dimensions,
        );
    }

    let client = Arc::new(Client::new());
    let chat = make_backend(config, config.chat, client.clone());
    let embed = if config.embedding == config.chat {
        chat.clone()
    } else {
        make_backend(config, config.embedding, client)
    };

    info!(
        chat = %config.chat,
        embedding = %config.embedding,
        dimensions = config.embedding_dimensions,
        "Provider gateway configured"
    );

    Gateway::new(
        chat,
        embed,
        config.settings(config.chat).chat_model.clone(),
        config.settings(config.embedding).embedding_model.clone(),
        config.embedding_dimensions,
    )
}

fn make_backend(
    config: &ProviderConfig,
    kind: ProviderKind,
    client: Arc<Client>,
) -> Arc<dyn ProviderBackend> {
    let settings = config.settings(kind);
    let timeout = Duration::from_secs(settings.timeout_seconds);

    match kind {
        ProviderKind::Openai => Arc::new(OpenAIBackend::new(
            settings.base_url.clone(),
            config.api_key(kind),
            timeout,
            client,
        )),
        ProviderKind::Openrouter => Arc::new(OpenRouterBackend::new(
            settings.base_url.clone(),
            config.api_key(kind),
            timeout,
            client,
        )),
        ProviderKind::Lmstudio => {
            Arc::new(LMStudioBackend::new(settings.base_url.clone(), timeout, client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_flag_selects_mock_backend() {
        let config = ProviderConfig {
            mock: true,
            embedding_dimensions: 16,
            ..ProviderConfig::default()
        };
        let gateway = build_gateway(&config);
        assert_eq!(gateway.chat_backend_name(), "mock");
        assert!(gateway.supports_tool_calls());
    }

    #[test]
    fn lmstudio_chat_disables_tool_calls() {
        let config = ProviderConfig {
            chat: ProviderKind::Lmstudio,
            ..ProviderConfig::default()
        };
        let gateway = build_gateway(&config);
        assert_eq!(gateway.chat_backend_name(), "lmstudio");
        assert!(!gateway.supports_tool_calls());
    }

    #[test]
    fn openai_defaults_build() {
        let gateway = build_gateway(&ProviderConfig::default());
        assert_eq!(gateway.chat_backend_name(), "openai");
    }
}
