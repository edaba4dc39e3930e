//! Live client sessions.
//!
//! A session is the server's record of one connected client. It tracks:
//! - WHO the client is (a player id, provisional until `init_client`)
//! - WHERE it is (its room name, `""` for the lobby)
//! - HOW to reach it (the sending half of its outbound queue)
//!
//! The receiving half of the queue belongs to the connection's outbound
//! pump. Closing the session drops the only sender, which lets that pump
//! drain what is left and stop.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use skirmish_protocol::Envelope;
use tokio::sync::{Mutex, RwLock, mpsc, watch};

/// Counter for generating unique session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Default capacity of a session's outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Registry key for a session. Unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connected client.
///
/// Shared as `Arc<Session>` between the registry, the connection's pumps,
/// and any handler that is currently fanning out to it.
pub struct Session {
    id: SessionId,
    player_id: RwLock<String>,
    room: RwLock<String>,
    outbound: Mutex<Option<mpsc::Sender<Envelope>>>,
    closed: watch::Sender<bool>,
}

impl Session {
    /// Creates a session with a provisional player id and an outbound
    /// queue holding up to `queue_capacity` events.
    ///
    /// Returns the session and the receiving half of its queue.
    pub fn new(queue_capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let (closed, _) = watch::channel(false);
        let session = Self {
            id: SessionId::next(),
            player_id: RwLock::new(generate_player_id()),
            room: RwLock::new(String::new()),
            outbound: Mutex::new(Some(tx)),
            closed,
        };
        (session, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn player_id(&self) -> String {
        self.player_id.read().await.clone()
    }

    pub async fn set_player_id(&self, player_id: impl Into<String>) {
        *self.player_id.write().await = player_id.into();
    }

    /// Current room name; `""` means the lobby.
    pub async fn room(&self) -> String {
        self.room.read().await.clone()
    }

    /// Moves the session to `room` and returns the room it was in.
    pub async fn set_room(&self, room: impl Into<String>) -> String {
        std::mem::replace(&mut *self.room.write().await, room.into())
    }

    /// Queues `envelope` for delivery without waiting.
    ///
    /// Returns `false` if the event was dropped: the queue is full (a slow
    /// client) or the session is already closed.
    pub async fn send(&self, envelope: Envelope) -> bool {
        let outbound = self.outbound.lock().await;
        let Some(tx) = outbound.as_ref() else {
            return false;
        };
        match tx.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                tracing::warn!(
                    session_id = %self.id,
                    kind = %envelope.kind,
                    "outbound queue full, dropping event"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Closes the outbound queue and signals the inbound pump to stop.
    ///
    /// Returns `true` on the first call only.
    pub async fn close(&self) -> bool {
        let sender = self.outbound.lock().await.take();
        self.closed.send_replace(true);
        sender.is_some()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Generates a random 32-character hex id (128 bits of entropy).
///
/// Used as the player id until the client sends `init_client`.
fn generate_player_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
