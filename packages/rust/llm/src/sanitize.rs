//! Normalization passes for model output that should contain structured data.
//!
//! Each pass is a function `&str -> String` (or `&str`) applied in sequence
//! before the text reaches a parser.

use std::sync::LazyLock;

use regex::Regex;

/// Run every pass and return text ready for a JSON object parser.
pub fn structured_payload(text: &str) -> String {
    let unfenced = strip_code_fences(text);
    extract_object(&unfenced).to_string()
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
///
/// Only the first fenced block is kept; text outside it is dropped. Text
/// without a fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?```").expect("valid regex")
    });

    match FENCE_RE.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Slice from the first `{` to the last `}` when prose surrounds an object.
pub fn extract_object(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
