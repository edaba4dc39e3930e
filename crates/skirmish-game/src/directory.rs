//! Game directory: tracks which rooms currently host a game.

use std::collections::HashMap;

use skirmish_protocol::Action;
use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{GameConfig, GameError, GameState, JoinOutcome, LeaveOutcome, RoomHandle, Submission};

/// Default command channel size for room actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns one room actor per room name that has a live game.
///
/// Games are created on the first join to a room and dropped when they
/// end. Operations on different rooms never wait on each other beyond the
/// short map lookup.
pub struct GameDirectory {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    config: GameConfig,
    channel_size: usize,
}

impl GameDirectory {
    pub fn new(config: GameConfig, channel_size: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            channel_size: channel_size.max(1),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seats `player_id` in the room's game, creating the game if the room
    /// has none.
    pub async fn join(&self, room: &str, player_id: &str) -> Result<JoinOutcome, GameError> {
        let mut rooms = self.rooms.lock().await;

        if let Some(handle) = rooms.get(room) {
            match handle.join(player_id).await {
                Err(GameError::Unavailable(_)) => {
                    // The game ended after the handle was fetched.
                    rooms.remove(room);
                }
                other => return other,
            }
        }

        let handle = spawn_room(room, self.config.clone(), self.channel_size);
        let outcome = handle.join(player_id).await?;
        rooms.insert(room.to_string(), handle);
        Ok(outcome)
    }

    /// Submits `action` for `player_id` in the room's game.
    ///
    /// # Errors
    /// - [`GameError::NoGame`] if the room has no game.
    /// - [`GameError::NotAPlayer`] if `player_id` holds no slot.
    pub async fn submit(
        &self,
        room: &str,
        player_id: &str,
        action: Action,
    ) -> Result<Submission, GameError> {
        let handle = self
            .handle(room)
            .await
            .ok_or_else(|| GameError::NoGame(room.to_string()))?;

        let result = handle.submit(player_id, action).await;
        let retired = match &result {
            Ok(Submission::Resolved(round)) => round.finished,
            Err(GameError::Unavailable(_)) => true,
            Err(_) | Ok(_) => false,
        };
        if retired {
            self.retire(&handle).await;
        }
        result.map_err(|e| match e {
            GameError::Unavailable(room) => GameError::NoGame(room),
            e => e,
        })
    }

    /// Removes `player_id` from the room's game. Leaving a room without a
    /// game is not an error.
    pub async fn leave(&self, room: &str, player_id: &str) -> Result<LeaveOutcome, GameError> {
        let Some(handle) = self.handle(room).await else {
            return Ok(LeaveOutcome::default());
        };

        match handle.leave(player_id).await {
            Ok(outcome) => {
                if outcome.torn_down {
                    self.retire(&handle).await;
                }
                Ok(outcome)
            }
            Err(GameError::Unavailable(_)) => {
                self.retire(&handle).await;
                Ok(LeaveOutcome::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Copies the room's current game state.
    pub async fn snapshot(&self, room: &str) -> Result<GameState, GameError> {
        let handle = self
            .handle(room)
            .await
            .ok_or_else(|| GameError::NoGame(room.to_string()))?;
        handle.snapshot().await.map_err(|e| match e {
            GameError::Unavailable(room) => GameError::NoGame(room),
            e => e,
        })
    }

    pub async fn has_game(&self, room: &str) -> bool {
        self.rooms.lock().await.contains_key(room)
    }

    pub async fn game_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    async fn handle(&self, room: &str) -> Option<RoomHandle> {
        self.rooms.lock().await.get(room).cloned()
    }

    /// Drops the directory entry for `handle`'s game, unless the room has
    /// already moved on to a newer game.
    async fn retire(&self, handle: &RoomHandle) {
        let mut rooms = self.rooms.lock().await;
        if rooms
            .get(handle.room())
            .is_some_and(|current| current.generation() == handle.generation())
        {
            rooms.remove(handle.room());
            tracing::debug!(room = %handle.room(), "game removed from directory");
        }
    }
}

impl Default for GameDirectory {
    fn default() -> Self {
        Self::new(GameConfig::default(), DEFAULT_CHANNEL_SIZE)
    }
}
