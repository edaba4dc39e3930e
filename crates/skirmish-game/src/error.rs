//! Error types for the game layer.

/// Domain errors raised while driving a room's game.
///
/// None of these are fatal to a connection: the hub logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No game exists for the room.
    #[error("no game in room {0:?}")]
    NoGame(String),

    /// The player holds neither slot in the room's game.
    #[error("player {player_id:?} is not playing in room {room:?}")]
    NotAPlayer { player_id: String, room: String },

    /// The room actor has shut down (its game just ended).
    #[error("room {0:?} is unavailable")]
    Unavailable(String),
}
