//! Game configuration and the per-room phase machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rules that are fixed for the lifetime of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of cells on the line. Positions run `0..cells`.
    pub cells: i32,

    /// The game ends on energy once the turn counter exceeds this.
    pub max_turns: u32,

    /// Energy each player starts with.
    pub starting_energy: i32,

    /// Starting cell for slot 1 and slot 2.
    pub start_positions: [i32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cells: 7,
            max_turns: 20,
            starting_energy: 10,
            start_positions: [2, 4],
        }
    }
}

impl GameConfig {
    /// Highest valid position.
    pub fn last_cell(&self) -> i32 {
        self.cells - 1
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where a room's game is in its lifecycle.
///
/// ```text
/// NoGame → AwaitingSecondPlayer → AwaitingActions ⇄ (resolve) → GameOver
/// ```
///
/// Resolution itself is synchronous inside the room actor, so it never
/// shows up as an observable phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NoGame,
    AwaitingSecondPlayer,
    AwaitingActions,
    GameOver,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoGame => write!(f, "NoGame"),
            Self::AwaitingSecondPlayer => write!(f, "AwaitingSecondPlayer"),
            Self::AwaitingActions => write!(f, "AwaitingActions"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}
