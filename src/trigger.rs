//! Running a command book by using it.
//!
//! A main-hand "use item" interaction with a writable book that has pages cancels the
//! default interaction and queues every page, sanitized and in order, to run as the
//! acting user. Command `i` is queued `i * spacing_ticks` ticks after the interaction.
//! Anything else (empty hand, another item, a book without pages, the off hand) is left
//! alone and the interaction proceeds normally.

use log::debug;

use crate::book::held_commands;
use crate::format::Message;
use crate::host::{Hand, Host};
use crate::logutil::{commands_preview, escape_log};
use crate::scheduler::{ScheduledCommand, TaskQueue};

/// Ticks between two consecutive commands of one book.
pub const DEFAULT_SPACING_TICKS: u64 = 2;

/// A player using the item in one of their hands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractEvent {
    pub actor: String,
    pub hand: Hand,
    cancelled: bool,
}

impl InteractEvent {
    pub fn new(actor: impl Into<String>, hand: Hand) -> Self {
        Self {
            actor: actor.into(),
            hand,
            cancelled: false,
        }
    }

    pub fn main_hand(actor: impl Into<String>) -> Self {
        Self::new(actor, Hand::Main)
    }

    /// Suppress the host's default handling of this interaction.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[derive(Debug, Clone)]
pub struct TriggerHandler {
    spacing_ticks: u64,
}

impl Default for TriggerHandler {
    fn default() -> Self {
        Self::new(DEFAULT_SPACING_TICKS)
    }
}

impl TriggerHandler {
    /// Spacing is at least one tick so delays stay strictly increasing.
    pub fn new(spacing_ticks: u64) -> Self {
        Self {
            spacing_ticks: spacing_ticks.max(1),
        }
    }

    /// Handle an interaction. Returns how many commands were queued.
    pub fn handle_interact<H: Host, Q: TaskQueue + ?Sized>(
        &self,
        host: &mut H,
        queue: &Q,
        event: &mut InteractEvent,
    ) -> usize {
        if event.hand != Hand::Main {
            return 0;
        }
        let actor = event.actor.clone();
        let commands = match held_commands(host.held_item(&actor, Hand::Main).as_ref()) {
            Some(commands) if !commands.is_empty() => commands,
            _ => return 0,
        };

        event.cancel();
        host.tell(&actor, Message::info("Processing commands..."));
        debug!(
            "queueing book for {}: {}",
            escape_log(&actor),
            commands_preview(&commands)
        );

        let count = commands.len();
        let mut delay_ticks = 0u64;
        for command in commands {
            queue.submit(ScheduledCommand {
                actor: actor.clone(),
                command,
                delay_ticks,
            });
            delay_ticks = delay_ticks.saturating_add(self.spacing_ticks);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{ItemKind, ItemStack};
    use crate::host::LocalHost;
    use crate::permissions::PermissionPolicy;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<ScheduledCommand>>);

    impl TaskQueue for Recorder {
        fn submit(&self, task: ScheduledCommand) {
            self.0.borrow_mut().push(task);
        }
    }

    fn host_holding(item: Option<ItemStack>) -> LocalHost {
        let mut host = LocalHost::new(PermissionPolicy::with_defaults());
        host.add_player("u1", "Alice");
        if let Some(item) = item {
            host.set_main_hand("u1", item);
        }
        host
    }

    #[test]
    fn schedules_pages_in_order_with_increasing_delays() {
        let book = ItemStack::build_book("b", vec!["cmd1".into(), "cmd2".into(), "cmd3".into()]);
        let mut host = host_holding(Some(book));
        let queue = Recorder::default();
        let mut event = InteractEvent::main_hand("u1");

        let n = TriggerHandler::default().handle_interact(&mut host, &queue, &mut event);

        assert_eq!(n, 3);
        assert!(event.is_cancelled());
        let tasks = queue.0.borrow();
        let commands: Vec<_> = tasks.iter().map(|t| t.command.as_str()).collect();
        assert_eq!(commands, vec!["cmd1", "cmd2", "cmd3"]);
        let delays: Vec<_> = tasks.iter().map(|t| t.delay_ticks).collect();
        assert_eq!(delays, vec![0, 2, 4]);
        assert!(tasks.iter().all(|t| t.actor == "u1"));
        assert_eq!(host.take_messages("u1"), vec![Message::info("Processing commands...")]);
    }

    #[test]
    fn book_without_pages_is_ignored() {
        for item in [
            ItemStack::build_book("empty", vec![]),
            ItemStack::writable_book(),
        ] {
            let mut host = host_holding(Some(item));
            let queue = Recorder::default();
            let mut event = InteractEvent::main_hand("u1");
            assert_eq!(TriggerHandler::default().handle_interact(&mut host, &queue, &mut event), 0);
            assert!(!event.is_cancelled());
            assert!(queue.0.borrow().is_empty());
            assert!(host.take_messages("u1").is_empty());
        }
    }

    #[test]
    fn other_items_and_empty_hands_are_ignored() {
        let mut signed = ItemStack::new(ItemKind::WrittenBook);
        signed.push_page("say hi");
        for item in [None, Some(ItemStack::new(ItemKind::Other("sword".into()))), Some(signed)] {
            let mut host = host_holding(item);
            let queue = Recorder::default();
            let mut event = InteractEvent::main_hand("u1");
            TriggerHandler::default().handle_interact(&mut host, &queue, &mut event);
            assert!(!event.is_cancelled());
            assert!(queue.0.borrow().is_empty());
        }
    }

    #[test]
    fn off_hand_use_is_ignored() {
        let book = ItemStack::build_book("b", vec!["say hi".into()]);
        let mut host = host_holding(Some(book));
        let queue = Recorder::default();
        let mut event = InteractEvent::new("u1", Hand::Off);
        TriggerHandler::default().handle_interact(&mut host, &queue, &mut event);
        assert!(!event.is_cancelled());
        assert!(queue.0.borrow().is_empty());
    }

    #[test]
    fn pages_are_sanitized_before_queueing() {
        let book = ItemStack::build_book("b", vec!["say\thello\nthere".into()]);
        let mut host = host_holding(Some(book));
        let queue = Recorder::default();
        let mut event = InteractEvent::main_hand("u1");
        TriggerHandler::new(5).handle_interact(&mut host, &queue, &mut event);
        assert_eq!(queue.0.borrow()[0].command, "say hello there");
    }
}
