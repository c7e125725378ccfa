//! Last-resort parsing of Japanese prose replies.
//!
//! When a model ignores the tool declaration and answers in natural
//! language, two phrasings show up often enough to handle directly:
//! replacement instructions like 「Xを「Y」に変更してください」 and a
//! labeled rewrite like 「修正案: ...」. Anything else is taken as the
//! rewrite itself. Heuristic results never carry fabricated offsets for
//! text the model did not locate.

use super::{CheckOutcome, ViolationSpan};
use regex::Regex;
use std::sync::OnceLock;

fn replacement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 「驚異的な効果」を「うれしい変化」に変更してください
        Regex::new("「([^」]+)」を「([^」]+)」に(?:変更|修正|言い換え)")
            .unwrap_or_else(|e| unreachable!("static regex: {}", e))
    })
}

fn suggestion_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 修正案: 毎日の健康習慣にどうぞ  /  修正案:全文...
        Regex::new("(?m)^\\s*修正案[::]\\s*(.+)$")
            .unwrap_or_else(|e| unreachable!("static regex: {}", e))
    })
}

/// Interpret a free-text reply that contained no parseable JSON.
///
/// Returns `None` only for blank replies; otherwise the reply is mapped
/// to a best-effort outcome, possibly with zero violations.
pub(crate) fn outcome_from_prose(reply: &str, original: &str) -> Option<CheckOutcome> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }

    // Replacement instructions: apply each and record a span where the
    // offending phrase sits in the original text.
    let mut modified = original.to_string();
    let mut violations = Vec::new();
    for captures in replacement_pattern().captures_iter(reply) {
        let from = &captures[1];
        let to = &captures[2];
        if let Some(span) = locate(original, from) {
            violations.push(ViolationSpan {
                start_pos: span.0,
                end_pos: span.1,
                reason: format!("「{}」への変更が提案されました", to),
                dictionary_id: None,
            });
        }
        modified = modified.replace(from, to);
    }
    if !violations.is_empty() || modified != original {
        return Some(CheckOutcome {
            modified,
            violations,
        });
    }

    // Labeled rewrite.
    if let Some(captures) = suggestion_pattern().captures(reply) {
        return Some(CheckOutcome {
            modified: captures[1].trim().to_string(),
            violations: Vec::new(),
        });
    }

    // The model echoing the input back means it found nothing to fix.
    if reply == original {
        return Some(CheckOutcome {
            modified: original.to_string(),
            violations: Vec::new(),
        });
    }

    // Otherwise treat the whole reply as the rewrite.
    Some(CheckOutcome {
        modified: reply.to_string(),
        violations: Vec::new(),
    })
}

/// Char-offset span of the first occurrence of `needle` in `haystack`.
fn locate(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let byte_pos = haystack.find(needle)?;
    let start = haystack[..byte_pos].chars().count();
    Some((start, start + needle.chars().count()))
}
