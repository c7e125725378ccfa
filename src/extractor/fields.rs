//! Field normalization for model-produced result objects.
//!
//! Models drift on field naming even when given a schema, so the
//! extractor accepts a small set of synonyms per field instead of
//! failing the whole check over a rename. Structural problems (a
//! violations value that is not a list, a missing rewrite) still fail;
//! a single out-of-bounds violation is dropped on its own.

use super::{CheckOutcome, ExtractError, ViolationSpan};
use serde_json::Value;
use tracing::warn;

const MODIFIED_KEYS: &[&str] = &[
    "modified",
    "modified_text",
    "modifiedText",
    "rewritten",
    "rewritten_text",
    "revised",
    "revised_text",
];

const VIOLATIONS_KEYS: &[&str] = &["violations", "issues", "ng_items", "findings"];

const START_KEYS: &[&str] = &["start_pos", "startPos", "start", "start_index"];
const END_KEYS: &[&str] = &["end_pos", "endPos", "end", "end_index"];
const REASON_KEYS: &[&str] = &["reason", "message", "description", "explanation"];
const DICTIONARY_KEYS: &[&str] = &["dictionary_id", "dictionaryId", "dict_id"];

fn pick<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(k))
}

/// Interpret a parsed JSON value as a check outcome.
///
/// `original` bounds the violation offsets: spans must satisfy
/// `start < end <= original.chars().count()` or they are discarded
/// individually.
pub(crate) fn outcome_from_value(
    value: &Value,
    original: &str,
) -> Result<CheckOutcome, ExtractError> {
    let object = value
        .as_object()
        .ok_or_else(|| ExtractError::InvalidShape("result is not a JSON object".to_string()))?;

    let modified = pick(value, MODIFIED_KEYS)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ExtractError::InvalidShape(format!(
                "no usable rewrite field among {:?}",
                object.keys().collect::<Vec<_>>()
            ))
        })?
        .to_string();

    let violations = match pick(value, VIOLATIONS_KEYS) {
        None => Vec::new(),
        Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => collect_violations(items, original),
        Some(other) => {
            return Err(ExtractError::InvalidShape(format!(
                "violations field is {} rather than a list",
                type_name(other)
            )))
        }
    };

    Ok(CheckOutcome {
        modified,
        violations,
    })
}

fn collect_violations(items: &[Value], original: &str) -> Vec<ViolationSpan> {
    let char_len = original.chars().count();
    let mut spans = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match violation_from_value(item, char_len) {
            Some(span) => spans.push(span),
            None => {
                warn!(index, "Dropping violation with missing or out-of-bounds span");
            }
        }
    }

    spans
}

fn violation_from_value(item: &Value, char_len: usize) -> Option<ViolationSpan> {
    let start = pick(item, START_KEYS).and_then(as_usize)?;
    let end = pick(item, END_KEYS).and_then(as_usize)?;
    let reason = pick(item, REASON_KEYS).and_then(Value::as_str)?.to_string();

    if start >= end || end > char_len {
        return None;
    }

    let dictionary_id = pick(item, DICTIONARY_KEYS)
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ViolationSpan {
        start_pos: start,
        end_pos: end,
        reason,
        dictionary_id,
    })
}

fn as_usize(value: &Value) -> Option<usize> {
    // Models sometimes emit offsets as strings or floats.
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as usize)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
