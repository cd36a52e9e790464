//! Input validation for book names and per-user store paths.

use std::path::{Path, PathBuf};

/// Longest accepted book name, in characters.
pub const MAX_BOOK_NAME_CHARS: usize = 64;

/// Book name validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookNameError {
    #[error("Book name cannot be empty")]
    Empty,

    #[error("Book name is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Book name contains control characters")]
    ControlCharacters,
}

/// Validate a user-supplied book name. Returns the trimmed name as typed (not case-folded).
pub fn validate_book_name(name: &str) -> Result<String, BookNameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BookNameError::Empty);
    }
    if trimmed.chars().count() > MAX_BOOK_NAME_CHARS {
        return Err(BookNameError::TooLong {
            max: MAX_BOOK_NAME_CHARS,
        });
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(BookNameError::ControlCharacters);
    }
    Ok(trimmed.to_string())
}

/// Storage key for a book name. Lookups are case-insensitive.
pub fn book_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Generate safe filename from a user id using URL encoding
pub fn safe_filename(user_id: &str) -> String {
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
    utf8_percent_encode(user_id, NON_ALPHANUMERIC).to_string()
}

/// Path of a user's book store: `<data_dir>/users/<safe id>.<ext>`.
pub fn user_store_path(data_dir: &Path, user_id: &str, ext: &str) -> PathBuf {
    data_dir
        .join("users")
        .join(format!("{}.{}", safe_filename(user_id), ext))
}
