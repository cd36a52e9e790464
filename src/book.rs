//! Item model for command books.
//!
//! A command book is an [`ItemStack`] of kind [`ItemKind::WritableBook`] whose pages are
//! raw command text. Every stack carries its own [`Uuid`]; [`ItemStack::duplicate`] hands
//! out a fresh identity so a copy never shares state with its source.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sanitize::extract_commands;

/// Kind of item a stack holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Editable book; the only kind that acts as a command book.
    WritableBook,
    /// Signed, read-only book.
    WrittenBook,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: Uuid,
    pub kind: ItemKind,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// `None` when the item has no page data at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<String>>,
}

impl ItemStack {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            quantity: 1,
            display_name: None,
            pages: None,
        }
    }

    /// A blank writable book with no pages yet.
    pub fn writable_book() -> Self {
        Self::new(ItemKind::WritableBook)
    }

    /// Build a writable book whose pages are `pages` in order, labelled `name`.
    pub fn build_book(name: &str, pages: Vec<String>) -> Self {
        Self {
            display_name: Some(name.to_string()),
            pages: Some(pages),
            ..Self::writable_book()
        }
    }

    pub fn is_command_book(&self) -> bool {
        self.kind == ItemKind::WritableBook
    }

    /// Append a page, creating the page list if needed.
    pub fn push_page(&mut self, text: impl Into<String>) {
        self.pages.get_or_insert_with(Vec::new).push(text.into());
    }

    /// Deep copy with a new identity.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Label shown to players.
    pub fn label(&self) -> String {
        match (&self.display_name, &self.kind) {
            (Some(name), _) => name.clone(),
            (None, ItemKind::WritableBook) => "Book and Quill".to_string(),
            (None, ItemKind::WrittenBook) => "Written Book".to_string(),
            (None, ItemKind::Other(kind)) => kind.clone(),
        }
    }
}

/// Commands held by a command book, sanitized page by page.
///
/// Short-circuits in a fixed order: no item, not a writable book, no page data. Each is
/// `None`. A writable book with an empty page list yields `Some(vec![])`.
pub fn held_commands(held: Option<&ItemStack>) -> Option<Vec<String>> {
    let item = held?;
    if !item.is_command_book() {
        return None;
    }
    let pages = item.pages.as_ref()?;
    Some(extract_commands(pages))
}
