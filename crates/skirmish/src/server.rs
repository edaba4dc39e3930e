//! `SkirmishServer` builder and accept loop.
//!
//! This is the entry point for running a Skirmish server. It ties the
//! layers together: transport → connection pumps → hub → game.

use std::sync::Arc;
use std::time::Duration;

use skirmish_game::GameConfig;
use skirmish_hub::Hub;
use skirmish_protocol::JsonCodec;
use skirmish_transport::{Handshake, Transport, WebSocketTransport};

use crate::connection::run_session;
use crate::{ServerConfig, SkirmishError};

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn start() -> Result<(), SkirmishError> {
/// let server = SkirmishServer::builder()
///     .bind("127.0.0.1:8080")
///     .max_frame_size(2048)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    config: ServerConfig,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration, e.g. one from
    /// [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the largest inbound message accepted, in bytes.
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    /// Sets how long a new peer may take to complete the WebSocket
    /// upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets how many outbound events each session buffers.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.hub.queue_capacity = capacity;
        self
    }

    /// Sets the rules for every game on this server.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.hub.game = game;
        self
    }

    /// Binds the listener. Nothing is accepted until
    /// [`run`](SkirmishServer::run) is called.
    ///
    /// # Errors
    /// [`SkirmishError::Transport`] if the address cannot be bound.
    pub async fn build(self) -> Result<SkirmishServer, SkirmishError> {
        let transport =
            WebSocketTransport::bind(&self.config.bind_addr, self.config.max_frame_size)
                .await?
                .with_handshake_timeout(self.config.handshake_timeout);
        let hub = Arc::new(Hub::new(self.config.hub.clone()));
        Ok(SkirmishServer {
            transport,
            hub,
            config: self.config,
        })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer {
    transport: WebSocketTransport,
    hub: Arc<Hub>,
    config: ServerConfig,
}

impl SkirmishServer {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The hub shared by every connection.
    pub fn hub(&self) -> Arc<Hub> {
        Arc::clone(&self.hub)
    }

    /// Runs the accept loop.
    ///
    /// Spawns one task per accepted peer. The WebSocket handshake runs on
    /// that task, so a peer that never upgrades only holds up itself. A
    /// failed accept or handshake is logged and the loop keeps going; this
    /// only returns if the task is cancelled.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!(
            addr = %self.config.bind_addr,
            max_frame_size = self.config.max_frame_size,
            "Skirmish server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let hub = Arc::clone(&self.hub);
                    let addr = pending.peer_addr();
                    tokio::spawn(async move {
                        match pending.complete().await {
                            Ok(conn) => run_session(conn, hub, JsonCodec).await,
                            Err(e) => {
                                tracing::debug!(%addr, error = %e, "handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
