//! Escaping for values interpolated into JavaScript source

/// Escape text for use inside a single-quoted JS string literal
pub fn js_single_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Collapse text onto one line so it cannot escape a `//` comment
pub fn line_comment(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
