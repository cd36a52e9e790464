//! Logging helpers that keep user-authored text (book names, page commands) on one line.

use std::fmt::Write;

/// Longest preview of user text written to the log.
const MAX_PREVIEW: usize = 120;

/// Escape a string for single-line logging. Line breaks, tabs and backslashes are
/// backslash-escaped, other control characters become `\xNN`, and anything past
/// [`MAX_PREVIEW`] characters is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Compact summary of a command list for debug logs: `[3] "a" | "b" | "c"`.
pub fn commands_preview(commands: &[String]) -> String {
    let mut out = format!("[{}]", commands.len());
    for (i, cmd) in commands.iter().enumerate() {
        out.push_str(if i == 0 { " " } else { " | " });
        let _ = write!(&mut out, "\"{}\"", escape_log(cmd));
        if out.len() > MAX_PREVIEW * 2 {
            out.push_str(" …");
            break;
        }
    }
    out
}
