//! Effect instruction set and resolver.
//!
//! Effects are pure data: a small instruction set attached to catalog items
//! and produced while folding game-master replies. The resolver interprets
//! them against a target player or the squad, deterministically and
//! atomically per call, and reports the *net applied* change (which may
//! differ from the requested change because of shield absorption and
//! clamping).
//!
//! All operations are total over well-formed input; out-of-range numbers are
//! coerced at the wire boundary, never rejected here.

use crate::loot::{roll_rarity, Rarity};
use crate::squad::{Player, MAX_LIFE_LIMIT, START_LIFE};
use crate::state::{GameState, MAX_LUCK_CHARGES};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Who receives drawn loot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LootTarget {
    #[default]
    Owner,
    Random,
}

/// One instruction applied to a player or the squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effect {
    /// Life change on the target player (shield absorbs losses first).
    Life { delta: i32 },
    /// Max-life change on the target player; gains also heal.
    MaxLife { delta: i32 },
    /// Squad score change.
    Score { delta: i64 },
    /// Damage shield points on the target player.
    Shield { points: i32 },
    /// Squad score multiplier for the next `turns` resolutions.
    ScoreBoost { multiplier: f64, turns: u32 },
    /// Tokens that flag a hinted option when questions are presented.
    PeekHint { count: u32 },
    /// Extends the mission by `count` turns.
    TurnExtension { count: i32 },
    /// Charges that upgrade future loot rarity one tier each.
    LuckCharge { count: u32 },
    /// Draw items from the pools.
    Loot {
        count: u32,
        rarity: Option<Rarity>,
        target: LootTarget,
    },
}

/// Net result of applying one effect, for feedback and history lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppliedEffect {
    LifeChanged {
        player_index: usize,
        requested: i32,
        applied: i32,
    },
    MaxLifeChanged {
        player_index: usize,
        gained: i32,
    },
    ScoreChanged {
        requested: i64,
        applied: i64,
    },
    ShieldAdded {
        player_index: usize,
        points: i32,
    },
    BoostSet {
        multiplier: f64,
        turns: u32,
    },
    PeekTokensAdded {
        count: u32,
    },
    TurnsExtended {
        new_max_turns: u32,
    },
    LuckAdded {
        charges: u32,
    },
    ItemGranted {
        player_index: usize,
        name: String,
        rarity: Rarity,
    },
}

/// Apply a life delta to one player.
///
/// Negative deltas are absorbed by the player's shield first; life is then
/// clamped to `[0, max_life]`. Returns the net applied delta.
pub fn apply_life_delta(player: &mut Player, delta: i32) -> i32 {
    if delta == 0 {
        return 0;
    }
    let mut adjusted = delta;

    if adjusted < 0 && player.shield > 0 {
        let absorb = player.shield.min(adjusted.abs());
        player.shield -= absorb;
        adjusted += absorb;
    }

    let before = player.life;
    player.life = (player.life + adjusted).clamp(0, player.max_life);
    player.life - before
}

/// Apply a max-life delta to one player.
///
/// The new maximum is clamped between the session-start life and a hard
/// ceiling; any gained maximum also heals the player by the same amount.
/// Returns the net gained maximum.
pub fn apply_max_life_delta(player: &mut Player, delta: i32) -> i32 {
    if delta == 0 {
        return 0;
    }
    let previous = player.max_life;
    player.max_life = (previous + delta).clamp(START_LIFE, MAX_LIFE_LIMIT);
    let gained = player.max_life - previous;
    if gained > 0 {
        player.life = (player.life + gained).clamp(0, player.max_life);
    }
    gained
}

/// Apply a score delta to the squad total.
///
/// When `use_multiplier` is set and a boost is active, positive deltas are
/// multiplied (rounded) and one boosted turn is consumed; the multiplier
/// clears when its turns run out. Score has no lower bound. Returns the net
/// applied delta.
pub fn apply_score_delta(state: &mut GameState, delta: i64, use_multiplier: bool) -> i64 {
    let mut applied = delta;
    if applied > 0 && use_multiplier && state.score_multiplier > 1.0 {
        applied = (applied as f64 * state.score_multiplier).round() as i64;
        state.score_boost_turns = state.score_boost_turns.saturating_sub(1);
        if state.score_boost_turns == 0 {
            state.score_multiplier = 1.0;
        }
    }
    state.score += applied;
    applied
}

/// Raise the squad score boost.
///
/// A stronger multiplier replaces the current boost; an equal multiplier
/// extends its duration. An active, stronger boost is never downgraded.
pub fn set_score_boost(state: &mut GameState, multiplier: f64, turns: u32) {
    let multiplier = multiplier.max(1.0);
    let turns = turns.max(1);
    if multiplier > state.score_multiplier {
        state.score_multiplier = multiplier;
        state.score_boost_turns = turns;
    } else if multiplier == state.score_multiplier && multiplier > 1.0 {
        state.score_boost_turns = state.score_boost_turns.max(turns);
    }
}

/// Draw `count` items into inventories.
///
/// Rarity comes from the explicit value or a weighted roll, then each item
/// is independently upgraded one tier per remaining luck charge (charges are
/// consumed one-for-one). Random targets pick a living player.
pub fn grant_loot<R: Rng>(
    state: &mut GameState,
    count: u32,
    rarity: Option<Rarity>,
    target: LootTarget,
    owner_index: usize,
    rng: &mut R,
) -> Vec<AppliedEffect> {
    let mut granted = Vec::new();
    for _ in 0..count.max(1) {
        let mut tier = rarity.unwrap_or_else(|| roll_rarity(rng));
        if state.luck_charges > 0 {
            tier = tier.upgrade(1);
            state.luck_charges -= 1;
        }

        let player_index = match target {
            LootTarget::Owner => owner_index,
            LootTarget::Random => state.random_living_index(rng).unwrap_or(owner_index),
        };

        if let Some(item) = state.loot_pools.draw(tier, rng) {
            granted.push(AppliedEffect::ItemGranted {
                player_index,
                name: item.name.clone(),
                rarity: item.rarity,
            });
            if let Some(player) = state.players.get_mut(player_index) {
                player.inventory.push(item);
            }
        }
    }
    granted
}

/// Interpret one effect against the session, with `owner_index` as the
/// target player for player-scoped instructions.
pub fn apply_effect<R: Rng>(
    state: &mut GameState,
    owner_index: usize,
    effect: &Effect,
    rng: &mut R,
) -> Vec<AppliedEffect> {
    match *effect {
        Effect::Life { delta } => {
            let Some(player) = state.players.get_mut(owner_index) else {
                return Vec::new();
            };
            let applied = apply_life_delta(player, delta);
            vec![AppliedEffect::LifeChanged {
                player_index: owner_index,
                requested: delta,
                applied,
            }]
        }
        Effect::MaxLife { delta } => {
            let Some(player) = state.players.get_mut(owner_index) else {
                return Vec::new();
            };
            let gained = apply_max_life_delta(player, delta);
            vec![AppliedEffect::MaxLifeChanged {
                player_index: owner_index,
                gained,
            }]
        }
        Effect::Score { delta } => {
            let applied = apply_score_delta(state, delta, false);
            vec![AppliedEffect::ScoreChanged {
                requested: delta,
                applied,
            }]
        }
        Effect::Shield { points } => {
            let Some(player) = state.players.get_mut(owner_index) else {
                return Vec::new();
            };
            player.shield += points.max(0);
            vec![AppliedEffect::ShieldAdded {
                player_index: owner_index,
                points: points.max(0),
            }]
        }
        Effect::ScoreBoost { multiplier, turns } => {
            set_score_boost(state, multiplier, turns);
            vec![AppliedEffect::BoostSet {
                multiplier: state.score_multiplier,
                turns: state.score_boost_turns,
            }]
        }
        Effect::PeekHint { count } => {
            state.peek_tokens += count;
            vec![AppliedEffect::PeekTokensAdded { count }]
        }
        Effect::TurnExtension { count } => {
            state.extend_turns(count);
            vec![AppliedEffect::TurnsExtended {
                new_max_turns: state.max_turns,
            }]
        }
        Effect::LuckCharge { count } => {
            let before = state.luck_charges;
            state.luck_charges = (state.luck_charges + count).min(MAX_LUCK_CHARGES);
            vec![AppliedEffect::LuckAdded {
                charges: state.luck_charges - before,
            }]
        }
        Effect::Loot {
            count,
            rarity,
            target,
        } => grant_loot(state, count, rarity, target, owner_index, rng),
    }
}

/// Interpret a list of effects in order.
pub fn apply_effects<R: Rng>(
    state: &mut GameState,
    owner_index: usize,
    effects: &[Effect],
    rng: &mut R,
) -> Vec<AppliedEffect> {
    let mut applied = Vec::new();
    for effect in effects {
        applied.extend(apply_effect(state, owner_index, effect, rng));
    }
    applied
}
