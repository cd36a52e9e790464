//! Command book command table and parser.
//!
//! Recognized forms (the leading `/` is optional):
//!
//! ```text
//! cmd save <name>
//! cmd load <name>
//! cmd load <user> <name>
//! cmd list
//! cmd list <user> [page]
//! cmd copy
//! cmd help
//! ```

use crate::permissions::Permission;

/// Root word shared by every command book command.
pub const ROOT: &str = "cmd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookCommand {
    Save { name: String },
    Load { user: Option<String>, name: String },
    List { user: Option<String>, page: usize },
    Copy,
    Help,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub usage: &'static str,
    pub summary: &'static str,
    pub permission: Option<Permission>,
}

pub const COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        usage: "cmd save <name>",
        summary: "save the held book's commands",
        permission: Some(Permission::Save),
    },
    CommandSpec {
        usage: "cmd load <name>",
        summary: "load one of your books",
        permission: Some(Permission::LoadSelf),
    },
    CommandSpec {
        usage: "cmd load <user> <name>",
        summary: "load another user's book",
        permission: Some(Permission::LoadOther),
    },
    CommandSpec {
        usage: "cmd list",
        summary: "list your books",
        permission: Some(Permission::ListSelf),
    },
    CommandSpec {
        usage: "cmd list <user> [page]",
        summary: "list another user's books",
        permission: Some(Permission::ListOther),
    },
    CommandSpec {
        usage: "cmd copy",
        summary: "duplicate the held book",
        permission: Some(Permission::Copy),
    },
    CommandSpec {
        usage: "cmd help",
        summary: "show this list",
        permission: None,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("not a command book command")]
    NotBookCommand,
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown subcommand '{0}'. Try: cmd help")]
    UnknownSubcommand(String),
}

/// True when `line` starts with the `cmd` root word.
pub fn is_book_command(line: &str) -> bool {
    split_root(line).is_some()
}

fn split_root(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let line = line.strip_prefix('/').unwrap_or(line);
    let rest = line.strip_prefix(ROOT)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

impl BookCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let rest = split_root(line).ok_or(ParseError::NotBookCommand)?;
        let mut words = rest.split_whitespace();
        let sub = words.next().map(|w| w.to_ascii_lowercase());
        let args: Vec<&str> = words.collect();

        match sub.as_deref() {
            None | Some("help") => Ok(BookCommand::Help),
            Some("save") => match args.as_slice() {
                [name] => Ok(BookCommand::Save {
                    name: name.to_string(),
                }),
                _ => Err(ParseError::Usage("cmd save <name>")),
            },
            Some("load") => match args.as_slice() {
                [name] => Ok(BookCommand::Load {
                    user: None,
                    name: name.to_string(),
                }),
                [user, name] => Ok(BookCommand::Load {
                    user: Some(user.to_string()),
                    name: name.to_string(),
                }),
                _ => Err(ParseError::Usage("cmd load [user] <name>")),
            },
            Some("list") => match args.as_slice() {
                [] => Ok(BookCommand::List { user: None, page: 1 }),
                [user] => Ok(BookCommand::List {
                    user: Some(user.to_string()),
                    page: 1,
                }),
                [user, page] => match page.parse::<usize>() {
                    Ok(page) if page > 0 => Ok(BookCommand::List {
                        user: Some(user.to_string()),
                        page,
                    }),
                    _ => Err(ParseError::Usage("cmd list <user> [page]")),
                },
                _ => Err(ParseError::Usage("cmd list [user] [page]")),
            },
            Some("copy") => match args.as_slice() {
                [] => Ok(BookCommand::Copy),
                _ => Err(ParseError::Usage("cmd copy")),
            },
            Some(other) => Err(ParseError::UnknownSubcommand(other.to_string())),
        }
    }

    /// Permission the caller must hold, `None` for help.
    pub fn required_permission(&self) -> Option<Permission> {
        match self {
            BookCommand::Save { .. } => Some(Permission::Save),
            BookCommand::Load { user: None, .. } => Some(Permission::LoadSelf),
            BookCommand::Load { user: Some(_), .. } => Some(Permission::LoadOther),
            BookCommand::List { user: None, .. } => Some(Permission::ListSelf),
            BookCommand::List { user: Some(_), .. } => Some(Permission::ListOther),
            BookCommand::Copy => Some(Permission::Copy),
            BookCommand::Help => None,
        }
    }
}
