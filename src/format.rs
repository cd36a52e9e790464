//! User-facing messages and paged listings.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageLevel {
    Info,
    Error,
}

/// One line of feedback for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == MessageLevel::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            MessageLevel::Info => write!(f, "{}", self.text),
            MessageLevel::Error => write!(f, "! {}", self.text),
        }
    }
}

/// Sorted, titled listing split into fixed-size pages. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct PagedList {
    title: String,
    lines: Vec<String>,
    page_size: usize,
}

impl PagedList {
    pub fn new(title: impl Into<String>, page_size: usize) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn page_count(&self) -> usize {
        self.lines.len().div_ceil(self.page_size).max(1)
    }

    /// Render `page` (clamped to the valid range) as lines: title, entries, footer.
    pub fn render(&self, page: usize) -> Vec<String> {
        let mut sorted = self.lines.clone();
        sorted.sort();

        let pages = self.page_count();
        let page = page.clamp(1, pages);
        let start = (page - 1) * self.page_size;

        let mut out = Vec::with_capacity(self.page_size + 2);
        out.push(self.title.clone());
        if sorted.is_empty() {
            out.push(" (none)".to_string());
        } else {
            out.extend(sorted.into_iter().skip(start).take(self.page_size));
        }
        if pages > 1 {
            out.push(format!("Page {}/{}", page, pages));
        }
        out
    }
}
