//! Response extraction.
//!
//! Turns whatever a backend returned into one canonical [`CheckOutcome`].
//! Tool-call replies are parsed strictly; free text goes through a
//! fallback chain ordered from most to least structured:
//!
//! 1. fenced ```json block
//! 2. any fenced block
//! 3. first brace-balanced object in the text
//! 4. Japanese prose heuristics
//!
//! Field-name synonyms are tolerated at every stage; structurally broken
//! results are not.

mod balance;
mod fields;
mod heuristics;

use crate::gateway::RawResponse;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Canonical result of one compliance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Full rewritten ad copy.
    pub modified: String,
    /// Flagged spans, in the order the model reported them.
    pub violations: Vec<ViolationSpan>,
}

/// One flagged span, with offsets counted in characters of the original
/// input text (Japanese copy makes byte offsets useless to the UI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationSpan {
    pub start_pos: usize,
    pub end_pos: usize,
    pub reason: String,
    /// Dictionary entry the model attributed the finding to, if any.
    pub dictionary_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    /// No stage of the chain produced a result object.
    #[error("Could not parse a check result from the response: {0}")]
    Parse(String),

    /// A result object was found but its structure is unusable.
    #[error("Check result has an invalid shape: {0}")]
    InvalidShape(String),
}

/// Extract a [`CheckOutcome`] from a raw backend response.
///
/// `original` is the text that was checked; it bounds violation offsets
/// and anchors the prose heuristics.
pub fn extract(raw: &RawResponse, original: &str) -> Result<CheckOutcome, ExtractError> {
    match raw {
        RawResponse::ToolCall { name, arguments } => {
            debug!(tool = %name, "Extracting from tool call");
            let value: Value = serde_json::from_str(arguments).map_err(|e| {
                ExtractError::Parse(format!("tool call arguments are not valid JSON: {}", e))
            })?;
            fields::outcome_from_value(&value, original)
        }
        RawResponse::Text(text) => extract_from_text(text, original),
    }
}

fn extract_from_text(text: &str, original: &str) -> Result<CheckOutcome, ExtractError> {
    for candidate in json_candidates(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            // A found object that parses but has a broken shape is a
            // real error, not a reason to keep scanning.
            return fields::outcome_from_value(&value, original);
        }
    }

    debug!("No parseable JSON in reply; falling back to prose heuristics");
    heuristics::outcome_from_prose(text, original)
        .ok_or_else(|| ExtractError::Parse("reply was empty".to_string()))
}

/// Candidate JSON payloads, most structured first.
fn json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(block) = fenced_block(text, "```json") {
        candidates.push(block);
    }
    if let Some(block) = fenced_block(text, "```") {
        candidates.push(block);
    }
    if let Some(object) = balance::balanced_json_object(text) {
        candidates.push(object.to_string());
    }

    candidates
}

/// Content of the first fence opened by `marker`, trimmed.
fn fenced_block(text: &str, marker: &str) -> Option<String> {
    let after_open = text.find(marker)? + marker.len();
    let rest = &text[after_open..];
    // "```" also matches the opening of a "```json" fence; consume the
    // language tag only when a newline follows it, so fence content that
    // merely starts with the letters "json" stays intact.
    let rest = match rest.strip_prefix("json") {
        Some(tagged) if tagged.starts_with(['\n', '\r']) => tagged,
        _ => rest,
    };
    let close = rest.find("```")?;
    Some(rest[..close].trim().to_string())
}
