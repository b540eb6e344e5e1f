use super::error::ScriptError;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Number of characters of an unparseable script echoed back in the error
const PREVIEW_CHARS: usize = 100;

/// Fenced markdown block holding a JSON object, with or without a `json` tag
static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced JSON pattern is valid")
});

/// Shape the LLM is prompted to produce: `{"segments": ["...", "..."]}`
#[derive(Debug, Deserialize)]
struct ScriptPayload {
    segments: Vec<Value>,
}

/// Parse the LLM-authored script into ordered, trimmed, non-blank segments.
///
/// Accepts either a bare JSON object or one wrapped in a fenced code block.
/// Items of `segments` that are not strings are ignored.
pub fn parse_segments(script: &str) -> Result<Vec<String>, ScriptError> {
    let script = script.trim();
    if script.is_empty() {
        return Err(ScriptError::Empty);
    }

    if let Some(segments) = segments_from_json(script) {
        return Ok(segments);
    }

    for captures in FENCED_JSON.captures_iter(script) {
        if let Some(segments) = captures.get(1).and_then(|m| segments_from_json(m.as_str())) {
            tracing::debug!(segment_count = segments.len(), "Script parsed from fenced block");
            return Ok(segments);
        }
    }

    let preview: String = script.chars().take(PREVIEW_CHARS).collect();
    tracing::warn!(preview = %preview, "Podcast script is not segment JSON");
    Err(ScriptError::Format { preview })
}

/// Segments of a JSON document, or None when it has the wrong shape or no usable text
fn segments_from_json(text: &str) -> Option<Vec<String>> {
    let payload: ScriptPayload = serde_json::from_str(text).ok()?;

    let segments: Vec<String> = payload
        .segments
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}
