//! Configuration module for yakulint
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`YAKULINT_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use yakulint::config::YakulintConfig;
//!
//! // Load defaults
//! let config = YakulintConfig::default();
//! assert_eq!(config.server.port, 8700);
//!
//! // Parse from TOML
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: YakulintConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```

pub mod error;
pub mod logging;
pub mod provider;
pub mod queue;
pub mod server;
pub mod worker;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use provider::{BackendSettings, ProviderConfig, ProviderKind};
pub use queue::QueueConfig;
pub use server::ServerConfig;
pub use worker::{WorkerConfig, MAX_INPUT_CHARS};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Unified configuration for the yakulint server.
///
/// Aggregates all configuration sections: HTTP server, AI providers, the
/// check queue, the worker pool, and logging.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct YakulintConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// AI provider selection and per-backend settings
    pub provider: ProviderConfig,
    /// Check queue bounds
    pub queue: QueueConfig,
    /// Worker pool configuration
    pub worker: WorkerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl YakulintConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports YAKULINT_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Server settings
        if let Ok(port) = std::env::var("YAKULINT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("YAKULINT_HOST") {
            self.server.host = host;
        }

        // Logging settings
        if let Ok(level) = std::env::var("YAKULINT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("YAKULINT_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        // Provider selection
        if let Ok(chat) = std::env::var("YAKULINT_CHAT_PROVIDER") {
            if let Ok(p) = ProviderKind::from_str(&chat) {
                self.provider.chat = p;
            }
        }
        if let Ok(embedding) = std::env::var("YAKULINT_EMBEDDING_PROVIDER") {
            if let Ok(p) = ProviderKind::from_str(&embedding) {
                self.provider.embedding = p;
            }
        }
        if let Ok(mock) = std::env::var("YAKULINT_MOCK_PROVIDER") {
            self.provider.mock = mock.to_lowercase() == "true";
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.worker.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.provider.embedding_dimensions == 0 {
            return Err(ConfigError::ZeroEmbeddingDimensions);
        }

        // Active providers need a base URL and a chat model unless mocked
        if !self.provider.mock {
            for (role, kind) in [
                ("chat", self.provider.chat),
                ("embedding", self.provider.embedding),
            ] {
                if self.provider.settings(kind).base_url.is_empty() {
                    return Err(ConfigError::MissingBaseUrl { role, kind });
                }
            }
            if self
                .provider
                .settings(self.provider.chat)
                .chat_model
                .is_empty()
            {
                return Err(ConfigError::MissingChatModel(self.provider.chat));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_defaults() {
        let config = YakulintConfig::default();
        assert_eq!(config.server.port, 8700);
        assert!(config.queue.enabled);
        assert_eq!(config.worker.concurrency, 4);
        assert_eq!(config.provider.chat, ProviderKind::Openai);
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [server]
        port = 9000
        "#;

        let config: YakulintConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0"); // Default
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../yakulint.example.toml");
        let config: YakulintConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = YakulintConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = YakulintConfig::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_env_override_port() {
        std::env::set_var("YAKULINT_PORT", "9999");
        let config = YakulintConfig::default().with_env_overrides();
        std::env::remove_var("YAKULINT_PORT");

        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_config_env_override_chat_provider() {
        std::env::set_var("YAKULINT_CHAT_PROVIDER", "lmstudio");
        let config = YakulintConfig::default().with_env_overrides();
        std::env::remove_var("YAKULINT_CHAT_PROVIDER");

        assert_eq!(config.provider.chat, ProviderKind::Lmstudio);
    }

    #[test]
    fn test_config_env_override_mock() {
        std::env::set_var("YAKULINT_MOCK_PROVIDER", "true");
        let config = YakulintConfig::default().with_env_overrides();
        std::env::remove_var("YAKULINT_MOCK_PROVIDER");

        assert!(config.provider.mock);
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("YAKULINT_PORT", "not-a-number");
        let config = YakulintConfig::default().with_env_overrides();
        std::env::remove_var("YAKULINT_PORT");

        // Should keep default, not crash
        assert_eq!(config.server.port, 8700);
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = YakulintConfig::default();
        config.server.port = 0;

        assert!(matches!(config.validate(), Err(ConfigError::ZeroPort)));
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let mut config = YakulintConfig::default();
        config.worker.concurrency = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_config_validation_zero_embedding_dimensions() {
        let mut config = YakulintConfig::default();
        config.provider.embedding_dimensions = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroEmbeddingDimensions)
        ));
    }

    #[test]
    fn test_config_validation_empty_base_url() {
        let mut config = YakulintConfig::default();
        config.provider.openai.base_url = String::new();

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::MissingBaseUrl {
                role: "chat",
                kind: ProviderKind::Openai
            })
        ));
    }

    #[test]
    fn test_config_validation_missing_chat_model() {
        let mut config = YakulintConfig::default();
        config.provider.openai.chat_model = String::new();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingChatModel(ProviderKind::Openai))
        ));
    }

    #[test]
    fn test_config_validation_mock_skips_backend_checks() {
        let mut config = YakulintConfig::default();
        config.provider.mock = true;
        config.provider.openai.base_url = String::new();

        assert!(config.validate().is_ok());
    }
}
