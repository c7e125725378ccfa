//! Brace-balanced JSON object scanning.

/// Find the first balanced `{...}` object in free text.
///
/// Walks the text once, tracking string state so braces inside JSON
/// string values do not confuse the depth count. Returns the slice of
/// the first object whose braces balance, or `None` when no opening
/// brace closes.
pub(crate) fn balanced_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}
