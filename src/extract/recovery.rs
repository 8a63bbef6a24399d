//! Best-effort recovery of assistant text from payloads that fail a JSON
//! parse (truncated exports, spreadsheet cells with broken quoting).
//!
//! This path is lossy. It never parses structure; it scans for the string
//! literal that follows an assistant role marker and undoes only the `\"`,
//! `\n` and `\t` escapes. A turn ends at the next `"role"` key, so text from
//! a later user or tool turn is never attributed to the assistant. The
//! structured path in `response.rs` always runs first.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static ASSISTANT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""role"\s*:\s*"assistant""#).expect("valid assistant marker regex")
});

static ROLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""role"\s*:"#).expect("valid role marker regex"));

static TEXT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"text"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid text field regex")
});

const ASSISTANT_LITERAL: &str = "\"assistant\"";

/// Returns the `text` value belonging to the last assistant turn, or failing
/// that, the first `text` value after an `"assistant"` literal and before the
/// next role key.
pub fn recover_assistant_text(raw: &str) -> Option<String> {
    let from_marker = ASSISTANT_MARKER
        .find_iter(raw)
        .filter_map(|marker| turn_text(&raw[marker.end()..]))
        .last();

    if from_marker.is_some() {
        debug!("recovered assistant text from role marker");
        return from_marker;
    }

    let offset = raw.find(ASSISTANT_LITERAL)?;
    let recovered = turn_text(&raw[offset + ASSISTANT_LITERAL.len()..]);

    if recovered.is_some() {
        debug!(offset, "recovered text field after assistant literal");
    }
    recovered
}

/// First non-blank `text` value in `rest`, up to the next role key.
fn turn_text(rest: &str) -> Option<String> {
    let turn_end = ROLE_MARKER
        .find(rest)
        .map_or(rest.len(), |next| next.start());

    TEXT_FIELD
        .captures(&rest[..turn_end])
        .and_then(|captures| captures.get(1))
        .map(|value| unescape(value.as_str()))
        .filter(|text| !text.trim().is_empty())
}

fn unescape(value: &str) -> String {
    value
        .replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}
