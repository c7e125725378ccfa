//! Check worker pool configuration

use serde::{Deserialize, Serialize};

/// Maximum accepted input length in characters.
///
/// Validated at submission time, before a check is persisted or queued.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Configuration for the check-processing worker pool.
///
/// # Example
///
/// ```toml
/// [worker]
/// concurrency = 4
/// max_retries = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of checks processed simultaneously.
    pub concurrency: usize,

    /// How many times a transient gateway failure is retried before the
    /// check is marked failed. Contract errors are never retried.
    pub max_retries: u32,

    /// Maximum input length in characters accepted at submission.
    pub max_input_chars: usize,

    /// LLM sampling temperature for compliance checks.
    pub temperature: f32,

    /// Cap on model output tokens.
    pub max_output_tokens: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_retries: 2,
            max_input_chars: MAX_INPUT_CHARS,
            temperature: 0.2,
            max_output_tokens: 4096,
        }
    }
}
