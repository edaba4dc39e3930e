//! Turn-based game engine for Skirmish rooms.
//!
//! Two players stand on a seven-cell line and submit one of five actions
//! per round. Once both have acted, the round resolves in one step:
//! movement, then reconciliation so they never share a cell, then combat.
//!
//! # Key types
//!
//! - [`engine`]: pure resolution rules ([`resolve_round`], [`evaluate`])
//! - [`GameState`]: one room's game and its per-viewer [`GameView`]
//! - [`GameDirectory`]: one room actor per room name with a live game
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GameConfig`] / [`GamePhase`]: rules and lifecycle

mod config;
mod directory;
pub mod engine;
mod error;
mod room;
mod state;

pub use config::{GameConfig, GamePhase};
pub use directory::{DEFAULT_CHANNEL_SIZE, GameDirectory};
pub use engine::{PlayerState, Slot, Verdict, evaluate, resolve_round};
pub use error::GameError;
pub use room::{JoinOutcome, LeaveOutcome, RoomHandle};
pub use state::{
    GameState, GameView, PlayerStates, PlayerView, RoundResult, STATUS_AWAITING_ACTION,
    STATUS_AWAITING_ARRIVAL, Seat, Submission,
};
