//! Interactive console host.
//!
//! Wires an in-memory [`LocalHost`] to the book service, the trigger handler and the
//! delayed scheduler, and reads player input from stdin. Commands released by the
//! scheduler are run as the player who used the book: `cmd ...` lines go back through
//! the command book table, anything else is reported as executed.

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::book::ItemStack;
use crate::commands::{is_book_command, BookCommand, ParseError};
use crate::config::Config;
use crate::format::Message;
use crate::host::{Hand, Inventory, LocalHost, MessageSink};
use crate::logutil::escape_log;
use crate::scheduler::{start_scheduler, ScheduledCommand, SchedulerHandle};
use crate::service::CommandBooks;
use crate::store::BookStore;
use crate::trigger::{InteractEvent, TriggerHandler};

const CONSOLE_HELP: &[&str] = &[
    "book             take a fresh book and quill",
    "write <text>     add a page to the held book (\\n and \\t are expanded)",
    "pages            show the held book's pages",
    "use              use the held book (runs its commands)",
    "inv              show hands and inventory",
    "hold <slot>      move an inventory slot into your hand",
    "as <name>        act as another player",
    "cmd ...          command book commands (cmd help)",
    "quit             leave",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    host: LocalHost,
    books: CommandBooks,
    trigger: TriggerHandler,
    scheduler: SchedulerHandle,
    released: mpsc::UnboundedReceiver<ScheduledCommand>,
    actor: String,
}

/// Stable id used for a console player name.
pub fn player_id(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Console {
    pub async fn new(config: &Config, player: &str) -> Result<Self> {
        let store = BookStore::new(&config.storage.data_dir).await?;
        let books = CommandBooks::new(store, config.listing.page_size);
        let trigger = TriggerHandler::new(config.trigger.ticks_between_commands);
        let (tx, released) = mpsc::unbounded_channel();
        let scheduler = start_scheduler(config.trigger.scheduler_config(), tx);

        let mut host = LocalHost::new(config.permissions.clone());
        let actor = player_id(player);
        host.add_player(&actor, player.trim());

        Ok(Self {
            host,
            books,
            trigger,
            scheduler,
            released,
            actor,
        })
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn host(&self) -> &LocalHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut LocalHost {
        &mut self.host
    }

    /// Next command released by the scheduler.
    pub async fn next_released(&mut self) -> Option<ScheduledCommand> {
        self.released.recv().await
    }

    /// Handle one line of player input. Returns the lines to show.
    pub async fn handle_line(&mut self, line: &str) -> Result<(Flow, Vec<String>)> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));
        let mut out = Vec::new();
        let actor = self.actor.clone();

        match word.to_ascii_lowercase().as_str() {
            "" => {}
            "quit" | "exit" => return Ok((Flow::Quit, out)),
            "help" | "?" => out.extend(CONSOLE_HELP.iter().map(|s| s.to_string())),
            "book" => {
                self.host.set_main_hand(&actor, ItemStack::writable_book());
                out.push("You take a book and quill.".to_string());
            }
            "write" => out.push(self.write_page(&actor, rest)),
            "pages" => out.extend(self.describe_pages(&actor)),
            "inv" => out.extend(self.describe_inventory(&actor)),
            "hold" => match rest.parse::<usize>() {
                Ok(slot) if slot > 0 && self.host.hold_slot(&actor, slot - 1) => {
                    out.push(format!("Now holding slot {}.", slot));
                }
                _ => out.push("! No such inventory slot".to_string()),
            },
            "as" if !rest.is_empty() => {
                let id = player_id(rest);
                self.host.add_player(&id, rest);
                self.actor = id;
                out.push(format!("Now acting as {}.", rest));
            }
            "use" => {
                let mut event = InteractEvent::main_hand(actor.clone());
                let queued = self
                    .trigger
                    .handle_interact(&mut self.host, &self.scheduler, &mut event);
                if !event.is_cancelled() {
                    out.push("Nothing happens.".to_string());
                } else {
                    info!("{} used a command book ({} commands)", escape_log(&actor), queued);
                }
            }
            _ if is_book_command(line) => self.dispatch(&actor, line).await?,
            _ => out.push(format!("! Unknown input '{}'. Type help.", escape_log(word))),
        }

        out.extend(self.drain_messages());
        Ok((Flow::Continue, out))
    }

    /// Run a released command as its actor.
    pub async fn run_released(&mut self, task: ScheduledCommand) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if is_book_command(&task.command) {
            self.dispatch(&task.actor, &task.command).await?;
        } else {
            info!(
                "executing as {}: {}",
                escape_log(&task.actor),
                escape_log(&task.command)
            );
            out.push(format!("[{}] > {}", task.actor, task.command));
        }
        out.extend(self.drain_messages());
        Ok(out)
    }

    /// Parse and run a `cmd ...` line as `actor`.
    async fn dispatch(&mut self, actor: &str, line: &str) -> Result<()> {
        match BookCommand::parse(line) {
            Ok(command) => self.books.execute(&mut self.host, actor, command).await,
            Err(ParseError::NotBookCommand) => Ok(()),
            Err(e) => {
                self.host.tell(actor, Message::error(e.to_string()));
                Ok(())
            }
        }
    }

    fn write_page(&mut self, actor: &str, text: &str) -> String {
        let text = text.replace("\\n", "\n").replace("\\t", "\t");
        let Some(player) = self.host.player_mut(actor) else {
            return "! Unknown player".to_string();
        };
        match player.main_hand.as_mut() {
            Some(item) if item.is_command_book() => {
                item.push_page(text);
                format!("Page {} written.", item.pages.as_ref().map_or(0, Vec::len))
            }
            _ => "! You are not holding a book and quill".to_string(),
        }
    }

    fn describe_pages(&self, actor: &str) -> Vec<String> {
        match self.host.held_item(actor, Hand::Main) {
            Some(item) => {
                let mut lines = vec![format!("{}:", item.label())];
                match item.pages.as_deref() {
                    Some(pages) if !pages.is_empty() => {
                        for (i, page) in pages.iter().enumerate() {
                            lines.push(format!(" {:>2}. {}", i + 1, escape_log(page)));
                        }
                    }
                    _ => lines.push(" (no pages)".to_string()),
                }
                lines
            }
            None => vec!["Your hand is empty.".to_string()],
        }
    }

    fn describe_inventory(&self, actor: &str) -> Vec<String> {
        let Some(player) = self.host.player(actor) else {
            return vec!["! Unknown player".to_string()];
        };
        let mut lines = vec![format!(
            "Hand: {}",
            player
                .main_hand
                .as_ref()
                .map_or("(empty)".to_string(), ItemStack::label)
        )];
        for (i, item) in player.inventory.iter().enumerate() {
            lines.push(format!(" {}. {}", i + 1, item.label()));
        }
        lines
    }

    /// Pending feedback for every player; other players' lines are prefixed with their id.
    fn drain_messages(&mut self) -> Vec<String> {
        let mut others: Vec<String> = self
            .host
            .player_ids()
            .into_iter()
            .filter(|id| *id != self.actor)
            .collect();
        others.sort();

        let mut out: Vec<String> = self
            .host
            .take_messages(&self.actor)
            .iter()
            .map(Message::to_string)
            .collect();
        for id in others {
            for msg in self.host.take_messages(&id) {
                out.push(format!("[{}] {}", id, msg));
            }
        }
        out
    }

    /// Read stdin until `quit` or end of input, interleaving released commands.
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("CommandBooks console. You are {}. Type help.", self.actor);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match self.handle_line(&line).await {
                        Ok((flow, out)) => {
                            for l in out {
                                println!("{}", l);
                            }
                            if flow == Flow::Quit {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("command failed: {:#}", e);
                            println!("! Error: {:#}", e);
                        }
                    }
                }
                Some(task) = self.released.recv() => {
                    match self.run_released(task).await {
                        Ok(out) => out.iter().for_each(|l| println!("{}", l)),
                        Err(e) => {
                            warn!("scheduled command failed: {:#}", e);
                            println!("! Error: {:#}", e);
                        }
                    }
                }
            }
        }

        self.scheduler.shutdown().await;
        Ok(())
    }
}
