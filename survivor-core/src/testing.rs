//! Testing utilities for the turn engine.
//!
//! - `MockGm` returns scripted replies in order, no API calls
//! - `TestHarness` drives whole runs against the real resolver
//! - Assertion helpers for common state checks

use crate::resolve::{apply_reply, TurnReport};
use crate::rng::SessionRng;
use crate::state::{GameState, QuestionOption, TurnError, DEFAULT_MAX_TURNS};
use narrator::{GmOption, GmReply};

/// A mock game master that returns scripted replies.
///
/// Use this for deterministic integration tests without a narrator service.
pub struct MockGm {
    replies: Vec<GmReply>,
    reply_index: usize,
}

impl MockGm {
    pub fn new(replies: Vec<GmReply>) -> Self {
        Self {
            replies,
            reply_index: 0,
        }
    }

    /// Add a reply to the end of the script.
    pub fn queue_reply(&mut self, reply: GmReply) {
        self.replies.push(reply);
    }

    /// Next scripted reply, or a closing reply once the script runs dry.
    pub fn next_reply(&mut self) -> GmReply {
        if self.reply_index < self.replies.len() {
            let reply = self.replies[self.reply_index].clone();
            self.reply_index += 1;
            reply
        } else {
            GmReply {
                narrative: "The story runs out of road.".to_string(),
                is_game_over: true,
                ..GmReply::default()
            }
        }
    }

    /// Replay the script from the beginning.
    pub fn reset(&mut self) {
        self.reply_index = 0;
    }
}

/// A reply that keeps the run going with a fresh one-option question.
pub fn continuing_reply(narrative: impl Into<String>) -> GmReply {
    GmReply {
        narrative: narrative.into(),
        question: Some("What now?".to_string()),
        options: vec![
            GmOption {
                id: "push-on".to_string(),
                text: "Push on".to_string(),
                requires_roll: false,
                roll_dc: None,
                roll_stat: None,
            },
            GmOption {
                id: "hold-back".to_string(),
                text: "Hold back".to_string(),
                requires_roll: false,
                roll_dc: None,
                roll_stat: None,
            },
        ],
        ..GmReply::default()
    }
}

/// Harness for running scripted sessions against the real state machine and
/// effect resolver.
pub struct TestHarness {
    pub gm: MockGm,
    pub state: GameState,
    pub rng: SessionRng,
}

impl TestHarness {
    /// A seeded harness for the given squad.
    pub fn new(names: &[&str]) -> Self {
        Self::with_turns(names, DEFAULT_MAX_TURNS)
    }

    pub fn with_turns(names: &[&str], max_turns: u32) -> Self {
        let mut rng = SessionRng::new(42);
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let state = GameState::new(&names, max_turns, &mut rng);
        Self {
            gm: MockGm::new(Vec::new()),
            state,
            rng,
        }
    }

    /// Queue a scripted reply.
    pub fn expect_reply(&mut self, reply: GmReply) -> &mut Self {
        self.gm.queue_reply(reply);
        self
    }

    /// Open a question directly, bypassing the narrator.
    pub fn open_question(&mut self, ids: &[&str]) {
        let options = ids
            .iter()
            .map(|id| QuestionOption {
                id: id.to_string(),
                text: format!("option {id}"),
                requires_roll: false,
                roll_dc: None,
                roll_stat: None,
                hinted: false,
            })
            .collect();
        self.state
            .begin_awaiting("What now?".to_string(), options, &mut self.rng);
    }

    /// Lock a choice for the player at `index`.
    pub fn submit(&mut self, index: usize, option_id: &str) -> Result<(), TurnError> {
        let player_id = self.state.players[index].id;
        self.state
            .submit_choice(player_id, option_id, &mut self.rng)
            .map(|_| ())
    }

    /// Every living player picks the same option.
    pub fn submit_all(&mut self, option_id: &str) {
        for index in self.state.living_indices() {
            self.submit(index, option_id)
                .expect("scripted choice should be accepted");
        }
    }

    /// Resolve the turn with the next scripted reply.
    pub fn resolve(&mut self) -> TurnReport {
        let reply = self.gm.next_reply();
        apply_reply(&mut self.state, &reply, &mut self.rng)
    }

    pub fn player_life(&self, index: usize) -> i32 {
        self.state.players[index].life
    }

    pub fn score(&self) -> i64 {
        self.state.score
    }

    pub fn squad_down(&self) -> bool {
        self.state.all_down()
    }
}

#[track_caller]
pub fn assert_game_over(harness: &TestHarness) {
    assert!(
        harness.state.is_game_over,
        "Expected the run to be over (turn {} of {})",
        harness.state.turn, harness.state.max_turns
    );
}

#[track_caller]
pub fn assert_awaiting_choices(harness: &TestHarness) {
    assert!(
        !harness.state.is_game_over,
        "Expected a live run, but it is over"
    );
    assert!(
        harness.state.current_question.is_some(),
        "Expected a live question"
    );
}

#[track_caller]
pub fn assert_inventory_count(harness: &TestHarness, index: usize, expected: usize) {
    let actual = harness.state.players[index].inventory.len();
    assert_eq!(
        actual, expected,
        "Expected player {index} to hold {expected} items, found {actual}"
    );
}
