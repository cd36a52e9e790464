//! Save, load, list and copy operations between a held book and the [`BookStore`].
//!
//! Each handler checks its permission first, then its preconditions, and reports the
//! outcome to the acting user through the host's [`MessageSink`](crate::host::MessageSink).
//! Precondition failures, unknown books and denied permissions are reported as messages
//! and change nothing. Storage failures are returned as errors and abort the command.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::book::{held_commands, ItemStack};
use crate::commands::{BookCommand, COMMAND_TABLE};
use crate::format::{Message, PagedList};
use crate::host::{Hand, Host, UserRef};
use crate::logutil::{commands_preview, escape_log};
use crate::permissions::Permission;
use crate::store::{BookStore, StoreError};
use crate::validation::validate_book_name;

pub const MSG_NOT_HOLDING: &str = "You are not holding a book";
pub const MSG_COPY_NOT_HOLDING: &str = "You must be holding a book to use this command";
pub const MSG_NO_SUCH_BOOK: &str = "A book by that name does not exist";
pub const MSG_DENIED: &str = "You do not have permission to use this command";

/// Default number of lines per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub struct CommandBooks {
    store: BookStore,
    page_size: usize,
}

impl CommandBooks {
    pub fn new(store: BookStore, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    /// Route a parsed command to its handler.
    pub async fn execute<H: Host>(&self, host: &mut H, actor: &str, command: BookCommand) -> Result<()> {
        debug!("book command actor={} {:?}", escape_log(actor), command);
        match command {
            BookCommand::Save { name } => self.save(host, actor, &name).await,
            BookCommand::Load { user, name } => self.load(host, actor, user.as_deref(), &name).await,
            BookCommand::List { user, page } => self.list(host, actor, user.as_deref(), page).await,
            BookCommand::Copy => {
                self.copy(host, actor);
                Ok(())
            }
            BookCommand::Help => {
                self.help(host, actor);
                Ok(())
            }
        }
    }

    /// Save the held book's commands under `name`.
    pub async fn save<H: Host>(&self, host: &mut H, actor: &str, name: &str) -> Result<()> {
        if !authorize(host, actor, Permission::Save) {
            return Ok(());
        }
        let Some(commands) = held_commands(host.held_item(actor, Hand::Main).as_ref()) else {
            host.tell(actor, Message::error(MSG_NOT_HOLDING));
            return Ok(());
        };
        let name = match validate_book_name(name) {
            Ok(name) => name,
            Err(e) => {
                host.tell(actor, Message::error(e.to_string()));
                return Ok(());
            }
        };

        debug!("saving {} for {}", commands_preview(&commands), escape_log(actor));
        self.store
            .save(actor, &name, commands)
            .await
            .with_context(|| format!("saving book '{}' for {}", name, actor))?;
        host.tell(actor, Message::info(format!("Saved CommandBook {}", name)));
        Ok(())
    }

    /// Load `name` from the actor's store, or from `target`'s when given, into the actor's
    /// inventory.
    pub async fn load<H: Host>(
        &self,
        host: &mut H,
        actor: &str,
        target: Option<&str>,
        name: &str,
    ) -> Result<()> {
        let permission = match target {
            None => Permission::LoadSelf,
            Some(_) => Permission::LoadOther,
        };
        if !authorize(host, actor, permission) {
            return Ok(());
        }
        let Some(owner) = resolve_target(host, actor, target) else {
            return Ok(());
        };
        let name = match validate_book_name(name) {
            Ok(name) => name,
            Err(e) => {
                host.tell(actor, Message::error(e.to_string()));
                return Ok(());
            }
        };

        let pages = match self.store.load(&owner.id, &name).await {
            Ok(pages) => pages,
            Err(StoreError::NotFound(_)) => {
                host.tell(actor, Message::error(MSG_NO_SUCH_BOOK));
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("loading book '{}' of {}", name, owner.id))
            }
        };

        let book = ItemStack::build_book(&name, pages);
        host.offer(actor, book);
        info!(
            "loaded book name={} owner={} into={}",
            escape_log(&name),
            escape_log(&owner.id),
            escape_log(actor)
        );
        host.tell(actor, Message::info(format!("Loaded CommandBook {}", name)));
        Ok(())
    }

    /// Send a sorted, paged listing of the target's (default: actor's) books.
    pub async fn list<H: Host>(
        &self,
        host: &mut H,
        actor: &str,
        target: Option<&str>,
        page: usize,
    ) -> Result<()> {
        let permission = match target {
            None => Permission::ListSelf,
            Some(_) => Permission::ListOther,
        };
        if !authorize(host, actor, permission) {
            return Ok(());
        }
        let Some(owner) = resolve_target(host, actor, target) else {
            return Ok(());
        };

        let names = self
            .store
            .list(&owner.id)
            .await
            .with_context(|| format!("listing books of {}", owner.id))?;
        let mut listing = PagedList::new(format!("{}'s CommandBooks", owner.name), self.page_size);
        for name in names {
            listing.line(format!(" - {}", name));
        }
        for line in listing.render(page) {
            host.tell(actor, Message::info(line));
        }
        Ok(())
    }

    /// Give the actor an independent copy of the held book.
    pub fn copy<H: Host>(&self, host: &mut H, actor: &str) {
        if !authorize(host, actor, Permission::Copy) {
            return;
        }
        let held = host
            .held_item(actor, Hand::Main)
            .filter(ItemStack::is_command_book);
        let Some(item) = held else {
            host.tell(actor, Message::error(MSG_COPY_NOT_HOLDING));
            return;
        };
        host.offer(actor, item.duplicate());
        host.tell(actor, Message::info("Copied CommandBook"));
    }

    /// List the commands the actor may use.
    pub fn help<H: Host>(&self, host: &mut H, actor: &str) {
        host.tell(actor, Message::info("CommandBooks commands:"));
        for spec in COMMAND_TABLE {
            let allowed = spec
                .permission
                .map_or(true, |p| host.has_permission(actor, p));
            if allowed {
                host.tell(actor, Message::info(format!(" {} - {}", spec.usage, spec.summary)));
            }
        }
    }
}

fn authorize<H: Host>(host: &mut H, actor: &str, permission: Permission) -> bool {
    if host.has_permission(actor, permission) {
        return true;
    }
    log::warn!(target: "security", "denied {} to {}", permission, escape_log(actor));
    host.tell(actor, Message::error(MSG_DENIED));
    false
}

/// The actor itself, or the named user. Unknown users are reported to the actor.
///
/// Self-operations always address the actor's own id; the directory only supplies the
/// display name, and only when it resolves to that same id.
fn resolve_target<H: Host>(host: &mut H, actor: &str, target: Option<&str>) -> Option<UserRef> {
    let Some(wanted) = target else {
        let name = host
            .find_user(actor)
            .filter(|user| user.id == actor)
            .map_or_else(|| actor.to_string(), |user| user.name);
        return Some(UserRef {
            id: actor.to_string(),
            name,
        });
    };
    match host.find_user(wanted) {
        Some(user) => Some(user),
        None => {
            host.tell(actor, Message::error(format!("Unknown user {}", wanted)));
            None
        }
    }
}
