//! Players, inventories, and item instances.
//!
//! A catalog entry is a template; what a player carries is an *instance*: a
//! clone with its own unique id, created when drawn from a pool, destroyed
//! when used, and moved (never copied) when shared.

use crate::catalog::ItemTemplate;
use crate::effects::Effect;
use crate::loot::Rarity;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Life every player starts with.
pub const START_LIFE: i32 = 4;

/// Hard ceiling for max life.
pub const MAX_LIFE_LIMIT: i32 = 9;

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a drawn item copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemInstanceId(pub Uuid);

impl ItemInstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Placeholder id for saves written before instance ids existed.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ItemInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A drawn copy of a catalog item, owned by exactly one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Missing in old saves; backfilled on load.
    #[serde(default = "ItemInstanceId::nil")]
    pub instance_id: ItemInstanceId,
    pub name: String,
    pub rarity: Rarity,
    pub effects: Vec<Effect>,
    pub description: String,
}

impl ItemInstance {
    /// Clone a template into a fresh instance with its own id.
    pub fn from_template(template: &ItemTemplate) -> Self {
        Self {
            instance_id: ItemInstanceId::new(),
            name: template.name.clone(),
            rarity: template.rarity,
            effects: template.effects.clone(),
            description: template.description.clone(),
        }
    }
}

/// One member of the squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub life: i32,
    pub max_life: i32,
    pub shield: i32,
    pub inventory: Vec<ItemInstance>,
}

impl Player {
    /// Create a player at starting life with an empty pack.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            life: START_LIFE,
            max_life: START_LIFE,
            shield: 0,
            inventory: Vec::new(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.life <= 0
    }

    /// Position of an owned item instance, if any.
    pub fn find_item(&self, instance_id: ItemInstanceId) -> Option<usize> {
        self.inventory
            .iter()
            .position(|item| item.instance_id == instance_id)
    }

    /// Remove and return an owned item instance.
    pub fn take_item(&mut self, instance_id: ItemInstanceId) -> Option<ItemInstance> {
        let index = self.find_item(instance_id)?;
        Some(self.inventory.remove(index))
    }
}
