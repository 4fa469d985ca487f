//! Keeps raw player input safe to put in a log line: control characters are
//! escaped and overlong lines truncated, so one pasted blob can't mangle the
//! log stream.

use std::fmt::Write;

const MAX_PREVIEW: usize = 120;

/// Render `s` as a single-line preview suitable for log output.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (i, ch) in s.chars().enumerate() {
        if i >= MAX_PREVIEW {
            out.push_str("...");
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
