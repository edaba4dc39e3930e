//! Error types for the hub.

use skirmish_game::GameError;
use skirmish_protocol::ProtocolError;

use crate::SessionId;

/// Errors raised while routing or handling a client event.
///
/// None of these end a session. The connection's inbound pump logs them
/// and reads the next frame.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Decoding, validation, or an unknown event type.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The game rejected the event.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The event needs a room and the session is in the lobby.
    #[error("{0} is not in a room")]
    NotInRoom(SessionId),

    /// `init_client` was sent while the session was inside a room.
    #[error("cannot change identity while in room {room:?}")]
    IdentityLocked { room: String },

    /// `init_client` named a player id another live session holds.
    #[error("player id {player_id:?} is already in use")]
    IdentityTaken { player_id: String },
}

impl HubError {
    /// Returns `true` for errors caused by a malformed or unsupported frame
    /// rather than by game rules.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}
