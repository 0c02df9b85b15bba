//! Folding game-master replies into the session state.
//!
//! [`build_request`] projects the state into the wire shape the narrator
//! service consumes; [`apply_reply`] interprets a reply atomically: narrative
//! to history, squad-wide deltas, per-player outcomes, rewards, and the
//! end-of-run transition. Replies are treated as untrusted advice: every
//! numeric lands in the effect resolver's clamps, and reward targets that
//! cannot be resolved fall back to a random living player.

use crate::effects::{self, AppliedEffect, LootTarget};
use crate::loot::Rarity;
use crate::state::{FinaleLine, GameState, QuestionOption};
use narrator::{GmChoice, GmOption, GmPlayer, GmReply, GmRequest, ItemReward, PlayerOutcome};
use rand::Rng;

/// What one resolution did, for UI feedback and host logs.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub turn: u32,
    pub narrative: String,
    pub applied: Vec<AppliedEffect>,
    pub game_over: bool,
}

/// Project the current state into a narrator request.
pub fn build_request(state: &GameState, scenario: Option<&str>) -> GmRequest {
    GmRequest {
        players: state
            .players
            .iter()
            .map(|p| GmPlayer {
                name: p.name.clone(),
                life: p.life,
                max_life: p.max_life,
                inventory: p.inventory.iter().map(|i| i.name.clone()).collect(),
            })
            .collect(),
        turn: state.turn,
        max_turns: state.max_turns,
        lives: state.squad_life(),
        max_lives: state.squad_max_life(),
        choices: state
            .pending_choices
            .iter()
            .map(|c| GmChoice {
                player: state
                    .players
                    .get(c.player_index)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                option_id: c.option_id.clone(),
                text: c.option_text.clone(),
                requires_roll: c.requires_roll,
                roll: c.roll_value,
                roll_dc: c.roll_dc,
            })
            .collect(),
        history: state.history.clone(),
        scenario: scenario.map(|s| s.to_string()),
        // The opening fetch resolves no choices and never asks for a finale,
        // even on a one-turn run.
        finale_required: !state.pending_choices.is_empty() && state.turn >= state.max_turns,
    }
}

fn option_from_wire(option: &GmOption) -> QuestionOption {
    QuestionOption {
        id: option.id.clone(),
        text: option.text.clone(),
        requires_roll: option.requires_roll,
        roll_dc: option.roll_dc,
        roll_stat: option.roll_stat.clone(),
        hinted: false,
    }
}

/// Find the player an outcome refers to: index first, then name, then the
/// choice it answers.
fn outcome_target(state: &GameState, outcome: &PlayerOutcome) -> Option<usize> {
    if let Some(index) = outcome.player_index {
        if index < state.players.len() {
            return Some(index);
        }
    }
    if let Some(name) = &outcome.name {
        let lower = name.to_lowercase();
        if let Some(index) = state
            .players
            .iter()
            .position(|p| p.name.to_lowercase() == lower)
        {
            return Some(index);
        }
    }
    if let Some(choice_id) = &outcome.choice_id {
        return state
            .pending_choices
            .iter()
            .find(|c| &c.option_id == choice_id)
            .map(|c| c.player_index);
    }
    None
}

fn grant_reward<R: Rng>(
    state: &mut GameState,
    reward: &ItemReward,
    fallback_index: Option<usize>,
    rng: &mut R,
    applied: &mut Vec<AppliedEffect>,
) {
    let rarity = reward.rarity.as_deref().and_then(Rarity::parse);
    let owner = reward
        .player_index
        .filter(|i| *i < state.players.len())
        .or(fallback_index)
        .or_else(|| state.random_living_index(rng));
    let Some(owner) = owner else {
        return;
    };
    applied.extend(effects::grant_loot(
        state,
        reward.count.max(1),
        rarity,
        LootTarget::Owner,
        owner,
        rng,
    ));
}

fn compile_finale(state: &mut GameState, reply: &GmReply) {
    state.finale = state
        .players
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let entry = reply.player_finale.iter().find(|f| {
                f.player_index == Some(index)
                    || f.name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase() == player.name.to_lowercase())
            });
            FinaleLine {
                player_index: index,
                name: player.name.clone(),
                survived: entry
                    .and_then(|f| f.survived)
                    .unwrap_or(!player.is_down()),
                text: entry.map(|f| f.text.clone()).unwrap_or_default(),
            }
        })
        .collect();
}

/// Interpret one reply against the state.
///
/// Order matters and mirrors resolution semantics: narrative, squad score
/// (multiplied), squad life delta on every living player, squad rewards,
/// per-player outcomes (unmultiplied scores), then the end-of-run check and
/// either the finale or the next question.
///
/// The opening fetch — no choices pending — only presents turn 1's question:
/// it neither consumes a turn nor triggers the turn-budget end check, so a
/// one-turn run still gets its one choice.
pub fn apply_reply<R: Rng>(state: &mut GameState, reply: &GmReply, rng: &mut R) -> TurnReport {
    let resolved_turn = state.turn;
    let resolved_choices = !state.pending_choices.is_empty();
    let mut applied = Vec::new();

    if !reply.narrative.is_empty() {
        state.append_history(&format!("TURN {resolved_turn}: {}", reply.narrative));
    }

    if reply.score_delta != 0 {
        let net = effects::apply_score_delta(state, reply.score_delta, true);
        applied.push(AppliedEffect::ScoreChanged {
            requested: reply.score_delta,
            applied: net,
        });
    }

    if reply.life_delta != 0 {
        for index in state.living_indices() {
            let net = effects::apply_life_delta(&mut state.players[index], reply.life_delta);
            applied.push(AppliedEffect::LifeChanged {
                player_index: index,
                requested: reply.life_delta,
                applied: net,
            });
        }
    }

    for reward in &reply.item_rewards {
        grant_reward(state, reward, None, rng, &mut applied);
    }

    for outcome in &reply.player_outcomes {
        let target = outcome_target(state, outcome);
        if let Some(index) = target {
            if outcome.life_delta != 0 {
                let net = effects::apply_life_delta(&mut state.players[index], outcome.life_delta);
                applied.push(AppliedEffect::LifeChanged {
                    player_index: index,
                    requested: outcome.life_delta,
                    applied: net,
                });
            }
            if outcome.score_delta != 0 {
                let net = effects::apply_score_delta(state, outcome.score_delta, false);
                applied.push(AppliedEffect::ScoreChanged {
                    requested: outcome.score_delta,
                    applied: net,
                });
            }
        }
        if let Some(reward) = &outcome.item_reward {
            grant_reward(state, reward, target, rng, &mut applied);
        }
    }

    state.pending_choices.clear();
    state.choice_order.clear();
    state.active_choice_cursor = 0;
    state.is_waiting_for_resolution = false;

    let next_question = reply
        .question
        .as_ref()
        .filter(|q| !q.is_empty() && !reply.options.is_empty());
    let game_over = reply.is_game_over
        || state.all_down()
        || (resolved_choices && state.turn >= state.max_turns)
        || next_question.is_none();

    if game_over {
        state.is_game_over = true;
        state.current_question = None;
        state.current_options.clear();
        compile_finale(state, reply);
    } else {
        if resolved_choices {
            state.turn += 1;
        }
        let question = next_question.cloned().unwrap_or_default();
        let options = reply.options.iter().map(option_from_wire).collect();
        state.begin_awaiting(question, options, rng);
    }

    TurnReport {
        turn: resolved_turn,
        narrative: reply.narrative.clone(),
        applied,
        game_over,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SessionRng;
    use crate::state::GameState;
    use narrator::FinaleEntry;

    fn squad(names: &[&str], max_turns: u32) -> (GameState, SessionRng) {
        let mut rng = SessionRng::new(11);
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let state = GameState::new(&names, max_turns, &mut rng);
        (state, rng)
    }

    fn continuing_reply() -> GmReply {
        GmReply {
            narrative: "The corridor holds.".into(),
            question: Some("Left or right?".into()),
            options: vec![
                GmOption {
                    id: "left".into(),
                    text: "Take the left fork".into(),
                    requires_roll: false,
                    roll_dc: None,
                    roll_stat: None,
                },
                GmOption {
                    id: "right".into(),
                    text: "Take the right fork".into(),
                    requires_roll: true,
                    roll_dc: Some(12),
                    roll_stat: Some("agility".into()),
                },
            ],
            ..GmReply::default()
        }
    }

    #[test]
    fn test_request_projects_state() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        state.players[0].shield = 2;
        state.begin_awaiting(
            "Go?".into(),
            vec![crate::state::QuestionOption {
                id: "go".into(),
                text: "Go".into(),
                requires_roll: false,
                roll_dc: None,
                roll_stat: None,
                hinted: false,
            }],
            &mut rng,
        );
        let id = state.players[0].id;
        state.submit_choice(id, "go", &mut rng).unwrap();

        let request = build_request(&state, Some("derelict station"));
        assert_eq!(request.players.len(), 2);
        assert_eq!(request.lives, 8);
        assert_eq!(request.max_lives, 8);
        assert_eq!(request.choices.len(), 1);
        assert_eq!(request.choices[0].player, "Ash");
        assert_eq!(request.scenario.as_deref(), Some("derelict station"));
        assert!(!request.finale_required);
    }

    fn submit_all(state: &mut GameState, rng: &mut SessionRng) {
        for index in state.living_indices() {
            let id = state.players[index].id;
            let option = state.current_options[0].id.clone();
            state.submit_choice(id, &option, rng).unwrap();
        }
    }

    #[test]
    fn test_finale_required_on_last_turn() {
        let (mut state, mut rng) = squad(&["Ash"], 3);
        state.turn = 3;
        // Fresh opening call at the budget boundary never asks for a finale.
        assert!(!build_request(&state, None).finale_required);

        apply_reply(&mut state, &continuing_reply(), &mut rng);
        submit_all(&mut state, &mut rng);
        assert!(build_request(&state, None).finale_required);
    }

    #[test]
    fn test_opening_fetch_presents_turn_one() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        let report = apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(!report.game_over);
        assert_eq!(report.turn, 1);
        // No choices were resolved, so no turn was consumed.
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_question.as_deref(), Some("Left or right?"));
        assert_eq!(state.current_options.len(), 2);
        assert_eq!(state.choice_order, vec![0, 1]);
        assert!(state.history.starts_with("TURN 1: The corridor holds."));
    }

    #[test]
    fn test_resolving_choices_advances_turn() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        apply_reply(&mut state, &continuing_reply(), &mut rng);
        submit_all(&mut state, &mut rng);

        let report = apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(!report.game_over);
        assert_eq!(report.turn, 1);
        assert_eq!(state.turn, 2);
        assert!(state.pending_choices.is_empty());
    }

    #[test]
    fn test_one_turn_run_plays_its_turn() {
        let (mut state, mut rng) = squad(&["Ash"], 1);
        let opening = apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(!opening.game_over);
        assert!(!state.is_game_over);
        assert_eq!(state.turn, 1);
        assert!(state.current_question.is_some());

        submit_all(&mut state, &mut rng);
        let closing = apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(closing.game_over);
        assert!(state.is_game_over);
        assert_eq!(state.finale.len(), 1);
    }

    #[test]
    fn test_global_life_delta_hits_every_living_player() {
        let (mut state, mut rng) = squad(&["Ash", "Bo", "Cy"], 5);
        state.players[2].life = 0;
        let reply = GmReply {
            life_delta: -2,
            ..continuing_reply()
        };
        apply_reply(&mut state, &reply, &mut rng);
        assert_eq!(state.players[0].life, 2);
        assert_eq!(state.players[1].life, 2);
        assert_eq!(state.players[2].life, 0);
    }

    #[test]
    fn test_global_score_uses_multiplier_outcomes_do_not() {
        let (mut state, mut rng) = squad(&["Ash"], 5);
        effects::set_score_boost(&mut state, 2.0, 1);
        let reply = GmReply {
            score_delta: 10,
            player_outcomes: vec![PlayerOutcome {
                player_index: Some(0),
                name: None,
                choice_id: None,
                life_delta: 0,
                score_delta: 5,
                item_reward: None,
            }],
            ..continuing_reply()
        };
        apply_reply(&mut state, &reply, &mut rng);
        assert_eq!(state.score, 25);
    }

    #[test]
    fn test_outcome_matched_by_name_then_choice() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        state.begin_awaiting(
            "Go?".into(),
            vec![crate::state::QuestionOption {
                id: "sneak".into(),
                text: "Sneak".into(),
                requires_roll: false,
                roll_dc: None,
                roll_stat: None,
                hinted: false,
            }],
            &mut rng,
        );
        let bo = state.players[1].id;
        state.submit_choice(bo, "sneak", &mut rng).unwrap();

        let reply = GmReply {
            player_outcomes: vec![
                PlayerOutcome {
                    player_index: None,
                    name: Some("ASH".into()),
                    choice_id: None,
                    life_delta: -1,
                    score_delta: 0,
                    item_reward: None,
                },
                PlayerOutcome {
                    player_index: None,
                    name: None,
                    choice_id: Some("sneak".into()),
                    life_delta: -2,
                    score_delta: 0,
                    item_reward: None,
                },
            ],
            ..continuing_reply()
        };
        apply_reply(&mut state, &reply, &mut rng);
        assert_eq!(state.players[0].life, 3);
        assert_eq!(state.players[1].life, 2);
    }

    #[test]
    fn test_item_reward_with_explicit_rarity_and_target() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        let reply = GmReply {
            item_rewards: vec![ItemReward {
                rarity: Some("epic".into()),
                count: 2,
                player_index: Some(1),
            }],
            ..continuing_reply()
        };
        apply_reply(&mut state, &reply, &mut rng);
        assert_eq!(state.players[1].inventory.len(), 2);
        assert!(state.players[1]
            .inventory
            .iter()
            .all(|i| i.rarity == Rarity::Epic));
    }

    #[test]
    fn test_game_over_flag_compiles_finale() {
        let (mut state, mut rng) = squad(&["Ash", "Bo"], 5);
        state.players[1].life = 0;
        let reply = GmReply {
            narrative: "The doors seal.".into(),
            is_game_over: true,
            player_finale: vec![FinaleEntry {
                player_index: Some(0),
                name: None,
                survived: Some(true),
                text: "Ash walks out into the dawn.".into(),
            }],
            ..GmReply::default()
        };
        let report = apply_reply(&mut state, &reply, &mut rng);
        assert!(report.game_over);
        assert!(state.is_game_over);
        assert_eq!(state.finale.len(), 2);
        assert!(state.finale[0].survived);
        assert_eq!(state.finale[0].text, "Ash walks out into the dawn.");
        assert!(!state.finale[1].survived);
        assert!(state.finale[1].text.is_empty());
        assert!(state.current_question.is_none());
    }

    #[test]
    fn test_run_ends_at_max_turns() {
        let (mut state, mut rng) = squad(&["Ash"], 2);
        apply_reply(&mut state, &continuing_reply(), &mut rng);
        submit_all(&mut state, &mut rng);
        apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(!state.is_game_over);
        assert_eq!(state.turn, 2);

        submit_all(&mut state, &mut rng);
        let report = apply_reply(&mut state, &continuing_reply(), &mut rng);
        assert!(report.game_over);
        assert!(state.is_game_over);
        assert_eq!(state.turn, 2);
    }

    #[test]
    fn test_reply_without_question_ends_run() {
        let (mut state, mut rng) = squad(&["Ash"], 5);
        let reply = GmReply {
            narrative: "Silence.".into(),
            ..GmReply::default()
        };
        let report = apply_reply(&mut state, &reply, &mut rng);
        assert!(report.game_over);
    }

    #[test]
    fn test_all_down_ends_run_even_when_reply_continues() {
        let (mut state, mut rng) = squad(&["Ash"], 5);
        let reply = GmReply {
            life_delta: -10,
            ..continuing_reply()
        };
        let report = apply_reply(&mut state, &reply, &mut rng);
        assert!(report.game_over);
        assert!(!state.finale[0].survived);
    }
}
