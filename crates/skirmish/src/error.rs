//! Unified error type for Skirmish.

use skirmish_game::GameError;
use skirmish_hub::HubError;
use skirmish_protocol::ProtocolError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Binding, accepting, or talking to a connection.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding or decoding envelopes.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rejected game operation.
    #[error(transparent)]
    Game(#[from] GameError),

    /// An event the hub could not handle.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// A configuration value could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    Config { key: String, reason: String },
}
