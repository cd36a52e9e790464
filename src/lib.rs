//! # CommandBooks - command macros stored in writable books
//!
//! A *command book* is a writable book whose pages are server commands. Players can save
//! the commands in a held book under a name, load them back onto a fresh book later, list
//! their saved books, duplicate a book, and use a held book to run its commands one after
//! another.
//!
//! ## Features
//!
//! - **Per-user stores**: one TOML file per user id, case-insensitive book names.
//! - **Page sanitization**: line breaks, tabs and control characters collapse to spaces.
//! - **Spaced execution**: used books queue their commands a few ticks apart.
//! - **Six permission nodes**: save, load/list for self and others, copy.
//! - **Host traits**: the game side (items, messages, permissions, users) is pluggable;
//!   [`host::LocalHost`] is a complete in-memory host.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use commandbooks::book::ItemStack;
//! use commandbooks::host::LocalHost;
//! use commandbooks::permissions::PermissionPolicy;
//! use commandbooks::service::CommandBooks;
//! use commandbooks::store::BookStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let books = CommandBooks::new(BookStore::new("./data").await?, 10);
//!     let mut host = LocalHost::new(PermissionPolicy::with_defaults());
//!     host.add_player("069a79f4", "Notch");
//!     host.set_main_hand("069a79f4", ItemStack::build_book("kit", vec!["give @p bread".into()]));
//!
//!     books.save(&mut host, "069a79f4", "Kit").await?;
//!     books.load(&mut host, "069a79f4", None, "kit").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`sanitize`] - page text to plain command strings
//! - [`book`] - item model and held-book extraction
//! - [`store`] - per-user persistence
//! - [`service`] - save / load / list / copy handlers
//! - [`trigger`] - running a used book through the [`scheduler`]
//! - [`commands`] - command table and parser
//! - [`permissions`] - permission nodes and grants
//! - [`host`] - collaborator traits and the in-memory host
//! - [`config`] - configuration management
//! - [`console`] - interactive console host used by the binary
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   cmd ...   ┌──────────────┐      ┌─────────────┐
//! │    Host      │ ──────────▶ │ CommandBooks │ ───▶ │  BookStore  │
//! │ (LocalHost)  │             └──────────────┘      └─────────────┘
//! │              │   use       ┌──────────────┐      ┌─────────────┐
//! │              │ ──────────▶ │   Trigger    │ ───▶ │  Scheduler  │
//! └──────────────┘             └──────────────┘      └─────────────┘
//!        ▲                                                  │
//!        └─────────────── released commands ────────────────┘
//! ```

pub mod book;
pub mod commands;
pub mod config;
pub mod console;
pub mod format;
pub mod host;
pub mod logutil;
pub mod permissions;
pub mod sanitize;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod trigger;
pub mod validation;
