//! Session snapshots on disk.
//!
//! One JSON document per save slot, carrying a format version so stale files
//! fail loudly instead of deserializing into nonsense. Loading also repairs
//! saves from before item instances carried ids.

use crate::state::GameState;
use crate::sync::ParticipantId;
use narrator::VoiceContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SAVE_VERSION: u32 = 1;

/// Default snapshot file name inside a save directory.
pub const SNAPSHOT_FILE: &str = "survivor-session.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}

/// Which screen the client should restore into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Setup,
    Game,
    Result,
}

/// Room membership to rejoin on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRoom {
    pub code: String,
    pub participant: ParticipantId,
    pub name: String,
    pub is_host: bool,
}

/// Everything needed to resume a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub version: u32,
    /// Unix seconds at save time, as a string.
    pub saved_at: String,
    pub state: GameState,
    #[serde(default)]
    pub last_narrative: Option<String>,
    #[serde(default)]
    pub voice_context: VoiceContext,
    #[serde(default)]
    pub active_panel: Panel,
    #[serde(default)]
    pub room: Option<StoredRoom>,
}

impl SavedSession {
    pub fn new(state: GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: unix_now(),
            state,
            last_narrative: None,
            voice_context: VoiceContext::default(),
            active_panel: Panel::Game,
            room: None,
        }
    }
}

/// Header fields readable without deserializing the whole state, for listing
/// save slots.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub saved_at: String,
}

fn unix_now() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// The single-slot snapshot path inside `dir`.
pub fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join(SNAPSHOT_FILE)
}

/// Write the session to `path`, pretty-printed.
pub async fn save_session(path: &Path, session: &SavedSession) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(session)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Read a session back, enforcing the format version and repairing any item
/// instance without an id.
pub async fn load_session(path: &Path) -> Result<SavedSession, PersistError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let mut session: SavedSession = serde_json::from_str(&contents)?;
    if session.version != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            found: session.version,
            expected: SAVE_VERSION,
        });
    }
    backfill_instance_ids(&mut session.state);
    Ok(session)
}

/// Read only the snapshot header. Tolerates unknown state layouts, so it
/// works on slots newer or older than this build.
pub async fn peek_metadata(path: &Path) -> Result<SnapshotMetadata, PersistError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

/// Saves written before items carried instance ids deserialize them as nil;
/// give those fresh ids so inventory moves keep working.
fn backfill_instance_ids(state: &mut GameState) {
    for player in &mut state.players {
        for item in &mut player.inventory {
            if item.instance_id.is_nil() {
                item.instance_id = crate::squad::ItemInstanceId(Uuid::new_v4());
            }
        }
    }
}
