//! Collaborators supplied by whatever hosts command books.
//!
//! The service and trigger handler never talk to a game engine directly. They read held
//! items, hand out items, check permissions, resolve users and send feedback through the
//! traits below. [`LocalHost`] is a complete in-memory implementation used by the console
//! binary and the tests.

use std::collections::HashMap;

use crate::book::ItemStack;
use crate::format::Message;
use crate::permissions::{Permission, PermissionPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Main,
    Off,
}

/// A known user: stable id plus current display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

pub trait Inventory {
    fn held_item(&self, user_id: &str, hand: Hand) -> Option<ItemStack>;
    /// Give an item to the user.
    fn offer(&mut self, user_id: &str, item: ItemStack);
}

pub trait MessageSink {
    fn tell(&mut self, user_id: &str, message: Message);
}

pub trait PermissionCheck {
    fn has_permission(&self, user_id: &str, permission: Permission) -> bool;
}

pub trait UserDirectory {
    /// Resolve a user by id or (case-insensitive) display name.
    fn find_user(&self, name_or_id: &str) -> Option<UserRef>;
}

/// Everything the command book handlers need from their host.
pub trait Host: Inventory + MessageSink + PermissionCheck + UserDirectory {}

impl<T: Inventory + MessageSink + PermissionCheck + UserDirectory> Host for T {}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub main_hand: Option<ItemStack>,
    pub off_hand: Option<ItemStack>,
    pub inventory: Vec<ItemStack>,
    pub inbox: Vec<Message>,
}

impl Player {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            main_hand: None,
            off_hand: None,
            inventory: Vec::new(),
            inbox: Vec::new(),
        }
    }
}

/// In-memory host: players, their hands and inventories, and a permission policy.
#[derive(Debug, Default)]
pub struct LocalHost {
    players: HashMap<String, Player>,
    policy: PermissionPolicy,
}

impl LocalHost {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            players: HashMap::new(),
            policy,
        }
    }

    /// Register a player; existing players keep their items.
    pub fn add_player(&mut self, id: &str, name: &str) -> &mut Player {
        self.players
            .entry(id.to_string())
            .or_insert_with(|| Player::new(id, name))
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    pub fn policy_mut(&mut self) -> &mut PermissionPolicy {
        &mut self.policy
    }

    /// Put `item` in the main hand, moving whatever was there into the inventory.
    pub fn set_main_hand(&mut self, id: &str, item: ItemStack) {
        if let Some(player) = self.players.get_mut(id) {
            if let Some(previous) = player.main_hand.replace(item) {
                player.inventory.push(previous);
            }
        }
    }

    /// Swap inventory slot `slot` (0-based) into the main hand.
    pub fn hold_slot(&mut self, id: &str, slot: usize) -> bool {
        let Some(player) = self.players.get_mut(id) else {
            return false;
        };
        if slot >= player.inventory.len() {
            return false;
        }
        let item = player.inventory.remove(slot);
        if let Some(previous) = player.main_hand.replace(item) {
            player.inventory.insert(slot, previous);
        }
        true
    }

    pub fn take_messages(&mut self, id: &str) -> Vec<Message> {
        self.players
            .get_mut(id)
            .map(|p| std::mem::take(&mut p.inbox))
            .unwrap_or_default()
    }
}

impl Inventory for LocalHost {
    fn held_item(&self, user_id: &str, hand: Hand) -> Option<ItemStack> {
        let player = self.players.get(user_id)?;
        match hand {
            Hand::Main => player.main_hand.clone(),
            Hand::Off => player.off_hand.clone(),
        }
    }

    fn offer(&mut self, user_id: &str, item: ItemStack) {
        if let Some(player) = self.players.get_mut(user_id) {
            if player.main_hand.is_none() {
                player.main_hand = Some(item);
            } else {
                player.inventory.push(item);
            }
        }
    }
}

impl MessageSink for LocalHost {
    fn tell(&mut self, user_id: &str, message: Message) {
        if let Some(player) = self.players.get_mut(user_id) {
            player.inbox.push(message);
        }
    }
}

impl PermissionCheck for LocalHost {
    fn has_permission(&self, user_id: &str, permission: Permission) -> bool {
        self.policy.allows(user_id, permission)
    }
}

impl UserDirectory for LocalHost {
    fn find_user(&self, name_or_id: &str) -> Option<UserRef> {
        let wanted = name_or_id.trim();
        self.players
            .get(wanted)
            .or_else(|| {
                self.players
                    .values()
                    .find(|p| p.name.eq_ignore_ascii_case(wanted))
            })
            .map(|p| UserRef {
                id: p.id.clone(),
                name: p.name.clone(),
            })
    }
}
