//! # Skirmish
//!
//! A real-time room server for a two-player positional combat game.
//!
//! Clients keep a WebSocket open, join named rooms, chat with whoever else
//! is in the room, and play a turn-based game on a seven-cell line: both
//! players pick one of five actions per round, and the server resolves
//! the round once both are in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! skirmish::init_tracing();
//! let server = SkirmishServer::builder()
//!     .config(ServerConfig::from_env()?)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod connection;
mod error;
mod logging;
mod server;

pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use connection::run_session;
pub use error::SkirmishError;
pub use logging::{DEFAULT_LOG_FILTER, init_tracing};
pub use server::{SkirmishServer, SkirmishServerBuilder};

/// Re-exports of the commonly used types from every layer.
pub mod prelude {
    pub use crate::{ServerConfig, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_game::{GameConfig, GameView, PlayerView};
    pub use skirmish_hub::{Hub, HubConfig};
    pub use skirmish_protocol::{Action, Envelope, kinds};
}
