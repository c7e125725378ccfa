//! Configuration error types.

use super::provider::ProviderKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the service configuration.
///
/// Validation failures are enumerated individually so startup output names
/// the exact setting an operator has to fix.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Config file is not valid TOML: {0}")]
    Parse(String),

    #[error("server.port must be non-zero")]
    ZeroPort,

    #[error("worker.concurrency must be non-zero; the pipeline needs at least one worker")]
    ZeroConcurrency,

    #[error("provider.embedding_dimensions must be non-zero")]
    ZeroEmbeddingDimensions,

    #[error("Unknown provider '{0}' (expected openai, openrouter, or lmstudio)")]
    UnknownProvider(String),

    #[error("The {kind} backend is selected for {role} but has no base_url configured")]
    MissingBaseUrl { role: &'static str, kind: ProviderKind },

    #[error("The {0} backend is selected for chat but has no chat_model configured")]
    MissingChatModel(ProviderKind),
}
