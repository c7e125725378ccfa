//! Logging configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Pretty-printed logs for humans
    #[default]
    Pretty,
    /// JSON logs for machine parsing
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-subsystem log levels, keyed by module under this crate
    /// (e.g., {"pipeline": "debug", "gateway": "trace"})
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
    /// Enable debug content logging (opt-in, defaults to false)
    /// WARNING: When true, submitted marketing text and model replies will
    /// be logged, which is customer data. Use only for debugging.
    #[serde(default)]
    pub enable_content_logging: bool,
}

impl LoggingConfig {
    /// Build the tracing env-filter directive string.
    ///
    /// The base level comes first; component levels are scoped to this
    /// crate and appended in sorted order so the directive string is
    /// stable across runs.
    pub fn filter_directives(&self) -> String {
        let mut directives = self.level.clone();
        if let Some(levels) = &self.component_levels {
            let mut components: Vec<_> = levels.iter().collect();
            components.sort();
            for (component, level) in components {
                directives.push_str(&format!(",yakulint::{}={}", component, level));
            }
        }
        directives
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
            enable_content_logging: false,
        }
    }
}
