//! High-level single-host session driver.
//!
//! `GameSession` owns the authoritative state, the seeded rng, and the
//! narrator client, and sequences the turn loop: open the run, collect
//! choices, resolve against the narrator, repeat until the finale. Narration
//! is mandatory; voice synthesis is advisory and never fails the turn.

use crate::persist::{self, Panel, PersistError, SavedSession};
use crate::resolve::{apply_reply, build_request, TurnReport};
use crate::rng::SessionRng;
use crate::squad::{ItemInstanceId, PlayerId};
use crate::state::{GameState, TurnError, DEFAULT_MAX_TURNS};
use narrator::{Narrator, VoiceContext, VoiceReply};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("narrator error: {0}")]
    Narrator(#[from] narrator::Error),
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("a resolution is already in flight")]
    ResolutionInProgress,
    #[error("not every living player has chosen yet")]
    NotReady,
    #[error("the run is already over")]
    GameOver,
}

/// How to set up a run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub player_names: Vec<String>,
    pub max_turns: u32,
    pub scenario: Option<String>,
    pub seed: Option<u64>,
}

impl SessionConfig {
    pub fn new(player_names: Vec<String>) -> Self {
        Self {
            player_names,
            max_turns: DEFAULT_MAX_TURNS,
            scenario: None,
            seed: None,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// Fix the rng seed, making the whole run reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One run from setup to finale.
pub struct GameSession {
    narrator: Narrator,
    state: GameState,
    rng: SessionRng,
    scenario: Option<String>,
    last_narrative: Option<String>,
    voice_context: VoiceContext,
}

impl GameSession {
    pub fn new(narrator: Narrator, config: SessionConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SessionRng::new(seed),
            None => SessionRng::from_entropy(),
        };
        let state = GameState::new(&config.player_names, config.max_turns, &mut rng);
        Self {
            narrator,
            state,
            rng,
            scenario: config.scenario,
            last_narrative: None,
            voice_context: VoiceContext::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn last_narrative(&self) -> Option<&str> {
        self.last_narrative.as_deref()
    }

    pub fn voice_context(&self) -> &VoiceContext {
        &self.voice_context
    }

    pub fn set_voice_context(&mut self, context: VoiceContext) {
        self.voice_context = context;
    }

    /// Open the run: ask the narrator for the opening scene and the first
    /// question. No choices exist yet, so this resolves an empty turn.
    pub async fn start(&mut self) -> Result<TurnReport, SessionError> {
        if self.state.is_game_over {
            return Err(SessionError::GameOver);
        }
        self.resolve_now().await
    }

    /// Lock one player's pick for the live question.
    pub fn submit_choice(
        &mut self,
        player_id: PlayerId,
        option_id: &str,
    ) -> Result<bool, SessionError> {
        self.state.submit_choice(player_id, option_id, &mut self.rng)?;
        Ok(self.state.ready_for_resolution())
    }

    /// Resolve the turn once every living player has chosen.
    ///
    /// On narrator failure the pending choices are kept and the waiting flag
    /// is cleared, so the host can simply retry.
    pub async fn resolve_turn(&mut self) -> Result<TurnReport, SessionError> {
        if self.state.is_game_over {
            return Err(SessionError::GameOver);
        }
        if self.state.is_waiting_for_resolution {
            return Err(SessionError::ResolutionInProgress);
        }
        if !self.state.ready_for_resolution() {
            return Err(SessionError::NotReady);
        }
        self.resolve_now().await
    }

    async fn resolve_now(&mut self) -> Result<TurnReport, SessionError> {
        self.state.is_waiting_for_resolution = true;
        let request = build_request(&self.state, self.scenario.as_deref());
        let reply = match self.narrator.resolve(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                self.state.is_waiting_for_resolution = false;
                return Err(err.into());
            }
        };
        let report = apply_reply(&mut self.state, &reply, &mut self.rng);
        self.last_narrative = Some(report.narrative.clone());
        Ok(report)
    }

    pub fn use_item(
        &mut self,
        player_id: PlayerId,
        item: ItemInstanceId,
    ) -> Result<(), SessionError> {
        self.state.use_item(player_id, item, &mut self.rng)?;
        Ok(())
    }

    pub fn share_item(
        &mut self,
        player_id: PlayerId,
        item: ItemInstanceId,
        target: PlayerId,
    ) -> Result<(), SessionError> {
        self.state.share_item(player_id, item, target)?;
        Ok(())
    }

    /// Speak the last narrative, if a voice endpoint is configured. Synthesis
    /// problems are reported as `None`, never as a session failure.
    pub async fn speak(&self) -> Option<VoiceReply> {
        let text = self.last_narrative.clone()?;
        let request = narrator::VoiceRequest {
            text,
            context: self.voice_context.clone(),
        };
        self.narrator.synthesize(&request).await.ok()
    }

    pub async fn save(&self, path: &Path) -> Result<(), SessionError> {
        let mut session = SavedSession::new(self.state.clone());
        session.last_narrative = self.last_narrative.clone();
        session.voice_context = self.voice_context.clone();
        session.active_panel = if self.state.is_game_over {
            Panel::Result
        } else {
            Panel::Game
        };
        persist::save_session(path, &session).await?;
        Ok(())
    }

    /// Resume from a snapshot, keeping the configured narrator.
    pub async fn load(narrator: Narrator, path: &Path) -> Result<Self, SessionError> {
        let saved = persist::load_session(path).await?;
        Ok(Self {
            narrator,
            state: saved.state,
            rng: SessionRng::from_entropy(),
            scenario: None,
            last_narrative: saved.last_narrative,
            voice_context: saved.voice_context,
        })
    }
}
