//! Text helpers shared by the channel formatters.

use chrono::{FixedOffset, TimeZone};

/// Offset used when displaying publication times (UTC+8).
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

const ELLIPSIS: &str = "...";

/// Escape the characters Telegram's HTML parse mode treats specially.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Truncate a string with ellipsis (Unicode-safe).
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}{ELLIPSIS}")
    } else {
        s.to_string()
    }
}

/// Cap a whole message at `limit` characters, ellipsis included.
#[must_use]
pub fn cap(message: String, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message;
    }
    let kept: String = message
        .chars()
        .take(limit.saturating_sub(ELLIPSIS.len()))
        .collect();
    format!("{kept}{ELLIPSIS}")
}

/// Publication time as `YYYY-MM-DD HH:MM (UTC+8)`.
#[must_use]
pub fn publish_time(publish_date_ms: i64) -> String {
    let Some(offset) = FixedOffset::east_opt(DISPLAY_OFFSET_SECS) else {
        return publish_date_ms.to_string();
    };
    offset
        .timestamp_millis_opt(publish_date_ms)
        .single()
        .map_or_else(
            || publish_date_ms.to_string(),
            |t| t.format("%Y-%m-%d %H:%M (UTC+8)").to_string(),
        )
}
