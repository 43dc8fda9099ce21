use chrono::{DateTime, Utc};

/// Format a Unix timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(), // Out of chrono's range, show the raw value
    }
}

/// Format a time for an HTTP header such as `Expires`
pub fn format_http_date(dt: DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Escape text for interpolation into HTML element content or attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
