//! # Book Store - per-user persistence for command books
//!
//! Each user owns one TOML file under the data directory. Top-level keys are case-folded
//! book names; values are the book's commands in page order:
//!
//! ```text
//! data/
//! └── users/
//!     ├── 069a79f4-44e9-4726-a5be-fca90e38aaf5.toml
//!     └── alice.toml
//! ```
//!
//! ```toml
//! build-kit = ["gamemode creative", "give @p stone 64"]
//! morning = ["time set day", "weather clear"]
//! ```
//!
//! Files are addressed by the user's stable id (never a display name) and created lazily
//! on first save. Reads of a missing file yield an empty store. A save holds an exclusive
//! fs2 lock on a hidden sidecar (`.<id>.toml.lock`) for the whole read-modify-write, so
//! other processes sharing the data directory are serialized too. The file is rewritten
//! through an fsynced temp file and an atomic rename, and is committed when the future
//! resolves.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use commandbooks::store::BookStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = BookStore::new("./data").await?;
//!     store.save("alice", "Morning", vec!["time set day".into()]).await?;
//!     let commands = store.load("alice", "morning").await?;
//!     assert_eq!(commands, vec!["time set day".to_string()]);
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use log::{debug, info};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::logutil::escape_log;
use crate::validation::{book_key, user_store_path};

/// Extension of per-user store files.
pub const STORE_EXTENSION: &str = "toml";

/// Upper bound on a store file we are willing to parse.
pub const MAX_STORE_FILE_BYTES: u64 = 1024 * 1024;

/// Errors raised by the book store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize book store: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{path} exceeds {limit} bytes")]
    FileTooLarge { path: PathBuf, limit: u64 },

    /// Returned when loading a book that is not stored for the user.
    #[error("book not found: {0}")]
    NotFound(String),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One user's books, as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserBookStore {
    path: PathBuf,
    books: BTreeMap<String, Vec<String>>,
}

impl UserBookStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&Vec<String>> {
        self.books.get(&book_key(name))
    }

    /// Insert or replace a book under its case-folded name.
    pub fn set(&mut self, name: &str, commands: Vec<String>) {
        self.books.insert(book_key(name), commands);
    }

    /// Stored names in key order.
    pub fn names(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Book store rooted at a data directory. Clones share one write gate, so concurrent
/// saves through the same store never lose each other's books.
#[derive(Debug, Clone)]
pub struct BookStore {
    data_dir: PathBuf,
    write_gate: Arc<Mutex<()>>,
}

impl BookStore {
    /// Initialize the store, creating `<data_dir>/users` if missing.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let users_dir = data_dir.join("users");
        fs::create_dir_all(&users_dir)
            .await
            .map_err(|e| StoreError::io(&users_dir, e))?;
        Ok(Self {
            data_dir,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn user_path(&self, user_id: &str) -> PathBuf {
        user_store_path(&self.data_dir, user_id, STORE_EXTENSION)
    }

    /// Open a user's store. A missing file is an empty store.
    pub async fn open(&self, user_id: &str) -> Result<UserBookStore, StoreError> {
        let path = self.user_path(user_id);
        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(UserBookStore {
                    path,
                    books: BTreeMap::new(),
                });
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        if metadata.len() > MAX_STORE_FILE_BYTES {
            return Err(StoreError::FileTooLarge {
                path,
                limit: MAX_STORE_FILE_BYTES,
            });
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        // Guard against any accidental leading NULs
        let cleaned = content.trim_start_matches('\0');
        let books: BTreeMap<String, Vec<String>> =
            toml::from_str(cleaned).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(UserBookStore { path, books })
    }

    /// Persist a user's store.
    pub async fn persist(&self, store: &UserBookStore) -> Result<(), StoreError> {
        let content = toml::to_string(&store.books)?;
        let _lock = lock_store(&store.path)?;
        replace_file(&store.path, &content)
    }

    /// Upsert `name -> commands` for the user and persist before returning.
    pub async fn save(
        &self,
        user_id: &str,
        name: &str,
        commands: Vec<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_gate.lock().await;
        let _lock = lock_store(&self.user_path(user_id))?;
        let mut store = self.open(user_id).await?;
        let count = commands.len();
        store.set(name, commands);
        let content = toml::to_string(&store.books)?;
        replace_file(&store.path, &content)?;
        info!(
            "saved book user={} name={} commands={}",
            escape_log(user_id),
            escape_log(&book_key(name)),
            count
        );
        Ok(())
    }

    /// Commands stored under the case-folded `name`.
    pub async fn load(&self, user_id: &str, name: &str) -> Result<Vec<String>, StoreError> {
        let store = self.open(user_id).await?;
        match store.get(name) {
            Some(commands) => {
                debug!(
                    "loaded book user={} name={} commands={}",
                    escape_log(user_id),
                    escape_log(&book_key(name)),
                    commands.len()
                );
                Ok(commands.clone())
            }
            None => Err(StoreError::NotFound(book_key(name))),
        }
    }

    /// All stored book names for the user.
    pub async fn list(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.open(user_id).await?.names())
    }
}

/// Sidecar lock file for a store file: `.<file name>.lock` next to it.
fn lock_path(path: &Path) -> PathBuf {
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("books.toml");
    path.with_file_name(format!(".{}.lock", base))
}

/// Take the exclusive lock guarding `path`. Released when the returned file is dropped.
fn lock_store(path: &Path) -> Result<File, StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    // The sidecar is never renamed, so every process locks the same inode.
    let lock = lock_path(path);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock)
        .map_err(|e| StoreError::io(&lock, e))?;
    file.lock_exclusive().map_err(|e| StoreError::io(&lock, e))?;
    Ok(file)
}

/// Replace `path` with `content` via an fsynced temp file + rename. The caller holds the
/// store lock. On failure the temp file is removed and `path` is left untouched.
fn replace_file(path: &Path, content: &str) -> Result<(), StoreError> {
    use std::io::Write;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("books.toml");
    let mut counter = 0u32;
    let (tmp_path, mut tmp) = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => break (candidate, file),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(StoreError::io(&candidate, e)),
        }
    };

    let committed = tmp
        .write_all(content.as_bytes())
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.sync_all())
        .map_err(|e| StoreError::io(&tmp_path, e))
        .and_then(|_| std::fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e)));
    drop(tmp);
    if let Err(e) = committed {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Best-effort fsync of the directory so the rename survives a crash.
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    Ok(())
}
