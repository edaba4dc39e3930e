//! Error types for the protocol layer.
//!
//! Decode failures and unknown event types are kept apart: the first means
//! the client sent something we could not read, the second means it sent
//! something well-formed that nothing on this server handles.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON text).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The frame is not a valid `{ "type", "payload" }` envelope.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope is fine but its payload does not match the shape its
    /// type tag requires.
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// No handler exists for this event type tag.
    #[error("no handler for event type: {0}")]
    UnknownEventType(String),
}
