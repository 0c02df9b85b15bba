//! Core session state and the turn/choice machine.
//!
//! `GameState` is the single authoritative value for a run: the squad, the
//! loot pools, the score, and the current question. It is plain serializable
//! data so hosts can broadcast it wholesale and snapshots can persist it.
//!
//! A turn moves through three phases: awaiting choices (a question with
//! options is live and players submit one pick each), waiting for resolution
//! (every living player has picked and the game master is being consulted),
//! and applying the reply (handled in [`crate::resolve`]).

use crate::catalog;
use crate::dice::roll_d20;
use crate::effects::{self, AppliedEffect};
use crate::loot::LootPools;
use crate::squad::{ItemInstance, ItemInstanceId, Player, PlayerId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Luck charges stop accumulating past this.
pub const MAX_LUCK_CHARGES: u32 = 5;

/// Mission length when the host does not configure one.
pub const DEFAULT_MAX_TURNS: u32 = 5;

/// Rejections for player intents. Invalid intents never mutate state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("the run is already over")]
    GameOver,
    #[error("a resolution is in progress")]
    ResolutionInProgress,
    #[error("no question is currently live")]
    NoQuestion,
    #[error("player has already chosen this turn")]
    DuplicateChoice,
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("unknown player")]
    UnknownPlayer,
    #[error("player is down")]
    PlayerDown,
    #[error("item not found in inventory")]
    ItemNotFound,
}

/// One option of the current question, as presented to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub requires_roll: bool,
    #[serde(default)]
    pub roll_dc: Option<u32>,
    #[serde(default)]
    pub roll_stat: Option<String>,
    /// Set on one option when a peek token was spent.
    #[serde(default)]
    pub hinted: bool,
}

/// A recorded pick, including any d20 made at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub player_id: PlayerId,
    pub player_index: usize,
    pub option_id: String,
    pub option_text: String,
    pub requires_roll: bool,
    pub roll_value: Option<u32>,
    pub roll_dc: Option<u32>,
}

/// A closing line for one player, compiled when the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinaleLine {
    pub player_index: usize,
    pub name: String,
    pub survived: bool,
    pub text: String,
}

/// The full authoritative state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: u32,
    pub max_turns: u32,
    pub players: Vec<Player>,
    pub score: i64,
    pub score_multiplier: f64,
    pub score_boost_turns: u32,
    pub peek_tokens: u32,
    pub luck_charges: u32,
    pub loot_pools: LootPools,
    /// Running transcript fed back to the game master each turn.
    pub history: String,
    pub current_question: Option<String>,
    pub current_options: Vec<QuestionOption>,
    pub pending_choices: Vec<Choice>,
    /// Player indices expected to choose this turn, in seating order.
    pub choice_order: Vec<usize>,
    /// How many of `choice_order` have already chosen.
    pub active_choice_cursor: usize,
    pub is_waiting_for_resolution: bool,
    pub is_game_over: bool,
    pub finale: Vec<FinaleLine>,
}

impl GameState {
    /// Fresh state for a named squad. Pools are shuffled from the given rng.
    pub fn new<R: Rng>(names: &[String], max_turns: u32, rng: &mut R) -> Self {
        Self {
            turn: 1,
            max_turns: max_turns.max(1),
            players: names.iter().map(|n| Player::new(n)).collect(),
            score: 0,
            score_multiplier: 1.0,
            score_boost_turns: 0,
            peek_tokens: 0,
            luck_charges: 0,
            loot_pools: LootPools::new(rng),
            history: String::new(),
            current_question: None,
            current_options: Vec::new(),
            pending_choices: Vec::new(),
            choice_order: Vec::new(),
            active_choice_cursor: 0,
            is_waiting_for_resolution: false,
            is_game_over: false,
            finale: Vec::new(),
        }
    }

    /// Indices of players still standing.
    pub fn living_indices(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_down())
            .map(|(i, _)| i)
            .collect()
    }

    /// A uniformly random living player, if any.
    pub fn random_living_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        self.living_indices().choose(rng).copied()
    }

    pub fn all_down(&self) -> bool {
        self.players.iter().all(|p| p.is_down())
    }

    pub fn squad_life(&self) -> i32 {
        self.players.iter().map(|p| p.life).sum()
    }

    pub fn squad_max_life(&self) -> i32 {
        self.players.iter().map(|p| p.max_life).sum()
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Grow or shrink the mission length. Never shrinks below the turn the
    /// squad has already reached.
    pub fn extend_turns(&mut self, delta: i32) {
        let proposed = self.max_turns as i64 + delta as i64;
        self.max_turns = (self.turn as i64).max(proposed).max(1) as u32;
    }

    pub fn append_history(&mut self, line: &str) {
        if !self.history.is_empty() {
            self.history.push('\n');
        }
        self.history.push_str(line);
    }

    /// Present a new question and open the choice window.
    ///
    /// The choice order is the living players in seating order. If the squad
    /// holds a peek token it is spent here, flagging one random option as
    /// hinted.
    pub fn begin_awaiting<R: Rng>(
        &mut self,
        question: String,
        mut options: Vec<QuestionOption>,
        rng: &mut R,
    ) {
        if self.peek_tokens > 0 && !options.is_empty() {
            self.peek_tokens -= 1;
            let hinted = rng.gen_range(0..options.len());
            options[hinted].hinted = true;
        }
        self.current_question = Some(question);
        self.current_options = options;
        self.pending_choices.clear();
        self.choice_order = self.living_indices();
        self.active_choice_cursor = 0;
        self.is_waiting_for_resolution = false;
    }

    /// Whose pick is expected next, when following seating order.
    pub fn next_chooser(&self) -> Option<usize> {
        self.choice_order.get(self.pending_choices.len()).copied()
    }

    /// True once every living player has locked a choice.
    pub fn ready_for_resolution(&self) -> bool {
        !self.choice_order.is_empty() && self.pending_choices.len() == self.choice_order.len()
    }

    /// Record one player's pick for the live question.
    ///
    /// If the option calls for a roll, the d20 is made here, at submission
    /// time, so every replica sees the same result via the broadcast state.
    pub fn submit_choice<R: Rng>(
        &mut self,
        player_id: PlayerId,
        option_id: &str,
        rng: &mut R,
    ) -> Result<Choice, TurnError> {
        if self.is_game_over {
            return Err(TurnError::GameOver);
        }
        if self.is_waiting_for_resolution {
            return Err(TurnError::ResolutionInProgress);
        }
        if self.current_question.is_none() {
            return Err(TurnError::NoQuestion);
        }
        let player_index = self.player_index(player_id).ok_or(TurnError::UnknownPlayer)?;
        if !self.choice_order.contains(&player_index) {
            return Err(TurnError::PlayerDown);
        }
        if self
            .pending_choices
            .iter()
            .any(|c| c.player_index == player_index)
        {
            return Err(TurnError::DuplicateChoice);
        }
        let option = self
            .current_options
            .iter()
            .find(|o| o.id == option_id)
            .ok_or_else(|| TurnError::UnknownOption(option_id.to_string()))?
            .clone();

        let roll_value = option.requires_roll.then(|| roll_d20(rng));
        let choice = Choice {
            player_id,
            player_index,
            option_id: option.id,
            option_text: option.text,
            requires_roll: option.requires_roll,
            roll_value,
            roll_dc: option.roll_dc,
        };
        self.pending_choices.push(choice.clone());
        self.active_choice_cursor = self.pending_choices.len();
        Ok(choice)
    }

    /// Use an item from a player's inventory, applying its effects to that
    /// player. The instance is consumed.
    pub fn use_item<R: Rng>(
        &mut self,
        player_id: PlayerId,
        instance_id: ItemInstanceId,
        rng: &mut R,
    ) -> Result<Vec<AppliedEffect>, TurnError> {
        if self.is_game_over {
            return Err(TurnError::GameOver);
        }
        let player_index = self.player_index(player_id).ok_or(TurnError::UnknownPlayer)?;
        let item = self.players[player_index]
            .take_item(instance_id)
            .ok_or(TurnError::ItemNotFound)?;
        let applied = effects::apply_effects(self, player_index, &item.effects, rng);
        self.append_history(&format!(
            "{} used {}.",
            self.players[player_index].name, item.name
        ));
        Ok(applied)
    }

    /// Move an item instance from one player's inventory to another's.
    pub fn share_item(
        &mut self,
        from: PlayerId,
        instance_id: ItemInstanceId,
        to: PlayerId,
    ) -> Result<(), TurnError> {
        if self.is_game_over {
            return Err(TurnError::GameOver);
        }
        let from_index = self.player_index(from).ok_or(TurnError::UnknownPlayer)?;
        let to_index = self.player_index(to).ok_or(TurnError::UnknownPlayer)?;
        if from_index == to_index {
            return Ok(());
        }
        let item = self.players[from_index]
            .take_item(instance_id)
            .ok_or(TurnError::ItemNotFound)?;
        let line = format!(
            "{} handed {} to {}.",
            self.players[from_index].name, item.name, self.players[to_index].name
        );
        self.players[to_index].inventory.push(item);
        self.append_history(&line);
        Ok(())
    }

    /// Grant one catalog item directly to a player, bypassing the pools.
    /// Used when restoring from saves that predate instance tracking.
    pub fn grant_template(&mut self, player_index: usize, template_id: &str) -> bool {
        match (
            self.players.get_mut(player_index),
            catalog::template(template_id),
        ) {
            (Some(player), Some(template)) => {
                player.inventory.push(ItemInstance::from_template(template));
                true
            }
            _ => false,
        }
    }
}
