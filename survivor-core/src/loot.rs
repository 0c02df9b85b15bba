//! Rarity tiers and per-game loot pools.
//!
//! Pools are draw-without-replacement queues, one per rarity, dealt from the
//! static catalog. An exhausted queue is rebuilt and reshuffled from the full
//! catalog subset, so drawing always succeeds while the catalog is non-empty.
//! What comes out of a pool is always a fresh instance, never the template.

use crate::catalog;
use crate::squad::ItemInstance;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Item rarity, lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Supreme,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Supreme,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Supreme => "supreme",
        }
    }

    /// Parse a rarity name from the wire; unknown values are `None`.
    pub fn parse(value: &str) -> Option<Rarity> {
        match value.trim().to_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            "supreme" => Some(Rarity::Supreme),
            _ => None,
        }
    }

    /// Upgrade by `steps` tiers, clamped to the top tier.
    pub fn upgrade(self, steps: u32) -> Rarity {
        let current = Rarity::ALL.iter().position(|r| *r == self).unwrap_or(0);
        let next = (current + steps as usize).min(Rarity::ALL.len() - 1);
        Rarity::ALL[next]
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Weighted tier table, in percent. Tunable in one place; the roll below
/// walks the cumulative sum.
pub const RARITY_WEIGHTS: [(Rarity, u32); 5] = [
    (Rarity::Common, 55),
    (Rarity::Rare, 25),
    (Rarity::Epic, 12),
    (Rarity::Legendary, 6),
    (Rarity::Supreme, 2),
];

/// Weighted categorical draw over the rarity table.
pub fn roll_rarity<R: Rng>(rng: &mut R) -> Rarity {
    let total: u32 = RARITY_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (rarity, weight) in RARITY_WEIGHTS {
        if roll < weight {
            return rarity;
        }
        roll -= weight;
    }
    Rarity::Supreme
}

/// Per-game draw queues, one per rarity.
///
/// Queues hold template ids so the whole structure serializes with the
/// session snapshot; templates are looked up in the catalog on draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootPools {
    queues: BTreeMap<Rarity, Vec<String>>,
}

impl LootPools {
    /// Partition the catalog by rarity into independently shuffled queues.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut queues = BTreeMap::new();
        for rarity in Rarity::ALL {
            queues.insert(rarity, Self::fresh_queue(rarity, rng));
        }
        Self { queues }
    }

    fn fresh_queue<R: Rng>(rarity: Rarity, rng: &mut R) -> Vec<String> {
        let mut ids: Vec<String> = catalog::templates_by_rarity(rarity)
            .iter()
            .map(|t| t.id.clone())
            .collect();
        ids.shuffle(rng);
        ids
    }

    /// Draw one item of the given rarity as a fresh instance.
    ///
    /// Rebuilds and reshuffles the queue when exhausted. Returns `None` only
    /// if the catalog holds no items of that rarity.
    pub fn draw<R: Rng>(&mut self, rarity: Rarity, rng: &mut R) -> Option<ItemInstance> {
        let queue = self.queues.entry(rarity).or_default();
        if queue.is_empty() {
            *queue = Self::fresh_queue(rarity, rng);
        }
        let id = queue.pop()?;
        catalog::template(&id).map(ItemInstance::from_template)
    }

    /// Remaining undrawn templates for a rarity.
    pub fn remaining(&self, rarity: Rarity) -> usize {
        self.queues.get(&rarity).map(|q| q.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SessionRng;

    #[test]
    fn test_upgrade_clamps_at_top() {
        assert_eq!(Rarity::Common.upgrade(1), Rarity::Rare);
        assert_eq!(Rarity::Legendary.upgrade(1), Rarity::Supreme);
        assert_eq!(Rarity::Supreme.upgrade(3), Rarity::Supreme);
        assert_eq!(Rarity::Common.upgrade(10), Rarity::Supreme);
    }

    #[test]
    fn test_parse_rarity() {
        assert_eq!(Rarity::parse("epic"), Some(Rarity::Epic));
        assert_eq!(Rarity::parse(" LEGENDARY "), Some(Rarity::Legendary));
        assert_eq!(Rarity::parse("mythic"), None);
    }

    #[test]
    fn test_roll_rarity_covers_tiers() {
        let mut rng = SessionRng::new(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            seen.insert(roll_rarity(&mut rng));
        }
        // All five tiers show up over enough draws.
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_roll_rarity_common_dominates() {
        let mut rng = SessionRng::new(4);
        let commons = (0..2000)
            .filter(|_| roll_rarity(&mut rng) == Rarity::Common)
            .count();
        assert!(commons > 900 && commons < 1300, "got {commons}");
    }

    #[test]
    fn test_draw_clones_instances() {
        let mut rng = SessionRng::new(12);
        let mut pools = LootPools::new(&mut rng);
        let a = pools.draw(Rarity::Supreme, &mut rng).unwrap();
        let b = pools.draw(Rarity::Supreme, &mut rng).unwrap();
        assert_ne!(a.instance_id, b.instance_id);
    }

    #[test]
    fn test_pool_exhaustion_reshuffles() {
        let mut rng = SessionRng::new(3);
        let mut pools = LootPools::new(&mut rng);
        let catalog_size = catalog::templates_by_rarity(Rarity::Legendary).len();
        assert!(catalog_size > 0);
        // Draw well past exhaustion; every draw must still produce an item.
        for _ in 0..(catalog_size * 3 + 1) {
            assert!(pools.draw(Rarity::Legendary, &mut rng).is_some());
        }
    }

    #[test]
    fn test_no_immediate_repeats_within_one_pass() {
        let mut rng = SessionRng::new(8);
        let mut pools = LootPools::new(&mut rng);
        let catalog_size = catalog::templates_by_rarity(Rarity::Epic).len();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..catalog_size {
            let item = pools.draw(Rarity::Epic, &mut rng).unwrap();
            assert!(seen.insert(item.name.clone()), "repeat before exhaustion");
        }
    }
}
