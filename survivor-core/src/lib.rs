//! Host-authoritative turn engine for an AI-narrated co-op survival game.
//!
//! This crate provides:
//! - Rarity-tiered loot pools drawn from a static catalog
//! - A deterministic effect resolver (life, shields, score boosts, luck)
//! - The turn/choice state machine for a whole squad
//! - Host/guest state replication over a pluggable transport
//! - Versioned session snapshots on disk
//!
//! # Quick Start
//!
//! ```ignore
//! use survivor_core::{GameSession, SessionConfig};
//! use narrator::Narrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new(vec!["Ash".into(), "Bo".into()])
//!         .with_scenario("derelict orbital station");
//!
//!     let mut session = GameSession::new(Narrator::from_env()?, config);
//!     let opening = session.start().await?;
//!     println!("{}", opening.narrative);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod dice;
pub mod effects;
pub mod loot;
pub mod persist;
pub mod resolve;
pub mod rng;
pub mod session;
pub mod squad;
pub mod state;
pub mod sync;
pub mod testing;

// Primary public API
pub use effects::{AppliedEffect, Effect, LootTarget};
pub use loot::{LootPools, Rarity};
pub use persist::{SavedSession, SAVE_VERSION};
pub use resolve::{apply_reply, build_request, TurnReport};
pub use rng::SessionRng;
pub use session::{GameSession, SessionConfig, SessionError};
pub use squad::{ItemInstance, ItemInstanceId, Player, PlayerId};
pub use state::{GameState, TurnError};
pub use sync::{Profile, Synchronizer, Transport, WireMessage};
pub use testing::{MockGm, TestHarness};
