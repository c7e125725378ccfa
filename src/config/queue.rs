//! Check queue configuration

use serde::{Deserialize, Serialize};

/// Configuration for the check queue.
///
/// Submitted checks wait here until a worker slot is free. When the queue
/// is full, submission fails immediately and the check is marked failed.
///
/// # Example
///
/// ```toml
/// [queue]
/// enabled = true
/// max_size = 200
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Whether check queuing is enabled.
    ///
    /// Default: true
    /// When false, every submission fails with a queue error.
    pub enabled: bool,

    /// Maximum number of queued checks.
    ///
    /// Default: 200
    /// When max_size is 0, queuing is disabled (equivalent to enabled=false).
    pub max_size: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 200,
        }
    }
}

impl QueueConfig {
    /// Check if queuing is effectively enabled.
    ///
    /// Queuing is disabled if either enabled=false or max_size=0.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.max_size > 0
    }
}
