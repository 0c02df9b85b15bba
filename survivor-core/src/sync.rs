//! Host-authoritative multiplayer synchronization.
//!
//! One participant is the host and owns the authoritative [`GameState`].
//! Guests render whatever snapshot the host last broadcast and send their
//! actions as intents; the host validates each intent against the current
//! state, applies it, and rebroadcasts. Invalid intents are dropped without
//! touching state, so a stale or malicious guest cannot corrupt the run.
//!
//! The transport is a trait so tests can run rooms fully in memory.

use crate::rng::SessionRng;
use crate::squad::{ItemInstanceId, PlayerId};
use crate::state::GameState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Room codes avoid ambiguous glyphs (no I, L, O, 0, 1).
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Standard room code length.
pub const ROOM_CODE_LEN: usize = 6;

/// Generate a join code from the unambiguous alphabet.
pub fn create_room_code<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len.max(1))
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("only the host may do this")]
    NotHost,
}

/// Identity of one connected participant (a device, not a character).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presence record for one participant in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ParticipantId,
    pub name: String,
    pub is_host: bool,
}

/// Everything that crosses the wire inside a room.
///
/// Broadcast channels echo messages back to their sender, so every message
/// carries its origin and receivers drop their own echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    /// Full authoritative state, host to room.
    Snapshot {
        sender: ParticipantId,
        state: Box<GameState>,
    },
    /// Guest intent: lock a choice for a player.
    SubmitChoice {
        sender: ParticipantId,
        player_id: PlayerId,
        option_id: String,
    },
    /// Guest intent: consume an inventory item.
    UseItem {
        sender: ParticipantId,
        player_id: PlayerId,
        item: ItemInstanceId,
    },
    /// Guest intent: hand an item to another player.
    ShareItem {
        sender: ParticipantId,
        player_id: PlayerId,
        item: ItemInstanceId,
        target: PlayerId,
    },
}

impl WireMessage {
    pub fn sender(&self) -> ParticipantId {
        match self {
            WireMessage::Snapshot { sender, .. }
            | WireMessage::SubmitChoice { sender, .. }
            | WireMessage::UseItem { sender, .. }
            | WireMessage::ShareItem { sender, .. } => *sender,
        }
    }
}

/// Outbound side of a room channel.
pub trait Transport {
    fn send(&self, message: &WireMessage) -> Result<(), SyncError>;
}

/// Room-level replication driver for one participant.
pub struct Synchronizer<T: Transport> {
    profile: Profile,
    transport: T,
    roster: Vec<Profile>,
    state: GameState,
    rng: SessionRng,
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(profile: Profile, transport: T, state: GameState, rng: SessionRng) -> Self {
        let roster = vec![profile.clone()];
        Self {
            profile,
            transport,
            roster,
            state,
            rng,
        }
    }

    pub fn is_host(&self) -> bool {
        self.profile.is_host
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn roster(&self) -> &[Profile] {
        &self.roster
    }

    /// The latest replicated state. On the host this is authoritative; on
    /// guests it is the last snapshot received.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Push the authoritative state to the room. Host only.
    pub fn broadcast_snapshot(&self) -> Result<(), SyncError> {
        if !self.is_host() {
            return Err(SyncError::NotHost);
        }
        self.transport.send(&WireMessage::Snapshot {
            sender: self.profile.id,
            state: Box::new(self.state.clone()),
        })
    }

    /// Sync the roster from a presence update. The host answers every roster
    /// change with a snapshot: joins so late guests catch up immediately,
    /// leaves so the remaining guests reconverge.
    pub fn handle_presence(&mut self, profiles: Vec<Profile>) -> Result<(), SyncError> {
        let changed = profiles != self.roster;
        self.roster = profiles;
        if changed && self.is_host() {
            self.broadcast_snapshot()?;
        }
        Ok(())
    }

    /// Feed one inbound message through the replication rules.
    ///
    /// Self-echoes are ignored. Guests accept snapshots wholesale (replaying
    /// the same snapshot twice is harmless). The host validates intents and,
    /// when one applies cleanly, rebroadcasts the updated state; intents that
    /// fail validation are dropped.
    pub fn handle_message(&mut self, message: &WireMessage) -> Result<(), SyncError> {
        if message.sender() == self.profile.id {
            return Ok(());
        }
        match message {
            WireMessage::Snapshot { state, .. } => {
                if !self.is_host() {
                    self.state = (**state).clone();
                }
                Ok(())
            }
            WireMessage::SubmitChoice {
                player_id,
                option_id,
                ..
            } => self.host_apply(|sync| {
                sync.state
                    .submit_choice(*player_id, option_id, &mut sync.rng)
                    .map(|_| ())
            }),
            WireMessage::UseItem {
                player_id, item, ..
            } => self.host_apply(|sync| {
                sync.state
                    .use_item(*player_id, *item, &mut sync.rng)
                    .map(|_| ())
            }),
            WireMessage::ShareItem {
                player_id,
                item,
                target,
                ..
            } => self.host_apply(|sync| sync.state.share_item(*player_id, *item, *target)),
        }
    }

    fn host_apply<E>(
        &mut self,
        apply: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), SyncError> {
        if !self.is_host() {
            return Ok(());
        }
        if apply(self).is_ok() {
            self.broadcast_snapshot()?;
        }
        Ok(())
    }

    /// Lock a choice for a player: locally on the host, via intent on guests.
    pub fn submit_choice(
        &mut self,
        player_id: PlayerId,
        option_id: &str,
    ) -> Result<(), SyncError> {
        if self.is_host() {
            if self
                .state
                .submit_choice(player_id, option_id, &mut self.rng)
                .is_ok()
            {
                self.broadcast_snapshot()?;
            }
            Ok(())
        } else {
            self.transport.send(&WireMessage::SubmitChoice {
                sender: self.profile.id,
                player_id,
                option_id: option_id.to_string(),
            })
        }
    }

    /// Use an item: locally on the host, via intent on guests.
    pub fn use_item(
        &mut self,
        player_id: PlayerId,
        item: ItemInstanceId,
    ) -> Result<(), SyncError> {
        if self.is_host() {
            if self.state.use_item(player_id, item, &mut self.rng).is_ok() {
                self.broadcast_snapshot()?;
            }
            Ok(())
        } else {
            self.transport.send(&WireMessage::UseItem {
                sender: self.profile.id,
                player_id,
                item,
            })
        }
    }

    /// Hand an item over: locally on the host, via intent on guests.
    pub fn share_item(
        &mut self,
        player_id: PlayerId,
        item: ItemInstanceId,
        target: PlayerId,
    ) -> Result<(), SyncError> {
        if self.is_host() {
            if self.state.share_item(player_id, item, target).is_ok() {
                self.broadcast_snapshot()?;
            }
            Ok(())
        } else {
            self.transport.send(&WireMessage::ShareItem {
                sender: self.profile.id,
                player_id,
                item,
                target,
            })
        }
    }
}
