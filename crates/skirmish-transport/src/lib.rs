//! Connection endpoint layer for Skirmish.
//!
//! Provides the [`Transport`] and [`Connection`] traits that the session
//! layer is written against. The core only ever needs two primitives from
//! a connection: "read the next text message" and "write a text message".
//! Everything about handshakes and framing stays behind these traits.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Default upper bound for a single inbound message, in bytes.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024;

/// Default time a newly accepted peer gets to finish the protocol
/// handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// An accepted peer that still has to complete the handshake.
    type Handshake: Handshake<Connection = Self::Connection, Error = Self::Error>;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next incoming peer.
    ///
    /// Returns as soon as the peer is accepted. No protocol bytes have been
    /// exchanged yet; call [`Handshake::complete`] for that, typically on
    /// the peer's own task.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Handshake, Self::Error>> + Send;
}

/// The second half of accepting a connection.
pub trait Handshake: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed or expired handshake.
    type Error: std::error::Error + Send + Sync;

    /// Runs the protocol handshake. Implementations bound how long a
    /// silent peer can hold this future open.
    fn complete(
        self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single connection that carries text messages in both directions.
///
/// The returned futures are `Send` so that a connection can be driven from
/// any task on the multi-threaded runtime. `send` and `recv` may be called
/// concurrently from two different tasks; implementations must not let a
/// pending `recv` block a `send`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one text message to the remote peer.
    fn send(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next text message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. Messages
    /// over the configured size limit are an error.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
