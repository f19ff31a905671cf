//! Shared utility functions used across multiple modules.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;

/// Placeholder shown when a timestamp is missing or cannot be parsed.
pub const TIMESTAMP_PLACEHOLDER: &str = "unknown";

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Parse an ISO-8601 timestamp as sent by the LMS (`2024-03-01T14:59:59Z`).
///
/// Returns `None` for absent, empty, or malformed input.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .ok()
}

/// Render a raw timestamp in `zone` for messages, degrading to a placeholder.
pub fn format_timestamp(raw: Option<&str>, zone: FixedOffset) -> String {
    parse_timestamp(raw).map_or_else(
        || TIMESTAMP_PLACEHOLDER.to_string(),
        |value| value.with_timezone(&zone).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Reduce LMS rich text (HTML) to a single line of plain text.
pub fn strip_html(html: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));
    let text = tags.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate text to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
