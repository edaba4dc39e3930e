//! The hub: process-wide registry of live sessions.
//!
//! Every connection registers a [`Session`] here. The hub owns the room
//! view (which sessions share a room name), the send primitives used by
//! the event handlers, and the [`GameDirectory`] holding each room's game.
//!
//! # Concurrency note
//!
//! The registry sits behind a `tokio::sync::RwLock`. Fan-out takes the
//! read lock only long enough to collect the recipients, then sends with
//! the lock released. Register and unregister take the write lock.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use skirmish_game::{DEFAULT_CHANNEL_SIZE, GameConfig, GameDirectory};
use skirmish_protocol::Envelope;
use tokio::sync::{RwLock, mpsc};

use crate::session::DEFAULT_QUEUE_CAPACITY;
use crate::{HubError, Session, SessionId};

// ---------------------------------------------------------------------------
// HubConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for the hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Outbound events buffered per session before new ones are dropped.
    pub queue_capacity: usize,

    /// Commands buffered per room actor.
    pub room_channel_size: usize,

    /// Rules for every game started by this hub.
    pub game: GameConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            room_channel_size: DEFAULT_CHANNEL_SIZE,
            game: GameConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// Registry of live sessions plus the games of their rooms.
///
/// Shared as `Arc<Hub>` by every connection task.
pub struct Hub {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    games: GameDirectory,
    config: HubConfig,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            games: GameDirectory::new(config.game.clone(), config.room_channel_size),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn games(&self) -> &GameDirectory {
        &self.games
    }

    /// Creates and registers a session for a new connection.
    ///
    /// Returns the session and the receiver its outbound pump drains.
    pub async fn connect(&self) -> (Arc<Session>, mpsc::Receiver<Envelope>) {
        let (session, rx) = Session::new(self.config.queue_capacity);
        let session = Arc::new(session);
        self.register(Arc::clone(&session)).await;
        (session, rx)
    }

    pub async fn register(&self, session: Arc<Session>) {
        let id = session.id();
        let count = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id, session);
            sessions.len()
        };
        tracing::info!(session_id = %id, sessions = count, "session registered");
    }

    /// Removes a session and tears it down.
    ///
    /// Closes its outbound queue (which stops the outbound pump and, in
    /// turn, the connection) and takes the player out of its room's game.
    /// Calling this again for the same session does nothing.
    pub async fn unregister(&self, id: SessionId) {
        let Some(session) = self.sessions.write().await.remove(&id) else {
            return;
        };
        session.close().await;
        self.leave_current_room(&session).await;
        tracing::info!(session_id = %id, "session unregistered");
    }

    /// Binds `player_id` to `session` unless another registered session
    /// already holds it.
    ///
    /// Runs under the registry write lock, so two sessions claiming the
    /// same id at once cannot both succeed.
    ///
    /// # Errors
    /// [`HubError::IdentityTaken`] if the id is in use elsewhere.
    pub async fn claim_player_id(
        &self,
        session: &Session,
        player_id: &str,
    ) -> Result<(), HubError> {
        let sessions = self.sessions.write().await;
        for other in sessions.values() {
            if other.id() != session.id() && other.player_id().await == player_id {
                return Err(HubError::IdentityTaken {
                    player_id: player_id.to_string(),
                });
            }
        }
        session.set_player_id(player_id).await;
        Ok(())
    }

    pub async fn session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Queues `envelope` for one session.
    pub async fn send_to(&self, session: &Session, envelope: Envelope) -> bool {
        session.send(envelope).await
    }

    /// Queues `envelope` for every session in `room` (`""` is the lobby).
    ///
    /// Returns how many sessions accepted it.
    pub async fn send_to_room(&self, room: &str, envelope: Envelope) -> usize {
        let members = self.sessions_in_room(room).await;
        let mut delivered = 0;
        for member in &members {
            if member.send(envelope.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Registered sessions whose current room is `room`.
    pub async fn sessions_in_room(&self, room: &str) -> Vec<Arc<Session>> {
        let sessions = self.sessions.read().await;
        let mut members = Vec::new();
        for session in sessions.values() {
            if session.room().await == room {
                members.push(Arc::clone(session));
            }
        }
        members
    }

    /// Sorted, de-duplicated names of every non-empty room.
    pub async fn list_rooms(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut rooms = BTreeSet::new();
        for session in sessions.values() {
            let room = session.room().await;
            if !room.is_empty() {
                rooms.insert(room);
            }
        }
        rooms.into_iter().collect()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
