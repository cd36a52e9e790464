//! Page sanitization: turns authored book pages into plain command strings.
//!
//! Book pages may carry tabs, line breaks, or stray control and formatting characters
//! left over when rich text is flattened. Every run of such characters collapses to a
//! single space so the command keeps its word boundaries. Printable glyphs and plain
//! spaces are never touched, so a page that is already plain comes back unchanged.

use regex::Regex;
use std::sync::OnceLock;

/// Whitespace other than U+0020, plus control (`Cc`) and format (`Cf`) characters.
const NON_PLAIN_RUN: &str = r"[[\s\p{Cc}\p{Cf}]&&[^ ]]+";

fn non_plain_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NON_PLAIN_RUN).expect("hardcoded regex"))
}

/// Sanitize one page into a plain command string.
pub fn sanitize_page(page: &str) -> String {
    non_plain_run().replace_all(page, " ").into_owned()
}

/// Sanitize every page, preserving page order 1:1.
pub fn extract_commands<S: AsRef<str>>(pages: &[S]) -> Vec<String> {
    pages.iter().map(|p| sanitize_page(p.as_ref())).collect()
}

/// True when the string holds only printable glyphs and plain spaces.
pub fn is_plain(s: &str) -> bool {
    !non_plain_run().is_match(s)
}
