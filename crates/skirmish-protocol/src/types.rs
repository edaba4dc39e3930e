//! Core protocol types for Skirmish's wire format.
//!
//! Every frame in either direction is an [`Envelope`]:
//!
//! ```text
//! { "type": "join_room", "payload": { "room": "default" } }
//! ```
//!
//! Inbound envelopes are validated into an [`InboundEvent`], a sum type with
//! one variant per type tag. Outbound envelopes are built from the small
//! payload structs at the bottom of this module.

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

/// The string tags carried in an envelope's `type` field.
pub mod kinds {
    pub const INIT_CLIENT: &str = "init_client";
    pub const JOIN_ROOM: &str = "join_room";
    pub const LIST_ROOMS: &str = "list_rooms";
    pub const LEAVE_ROOM: &str = "leave_room";
    pub const SEND_MESSAGE: &str = "send_message";
    pub const NEW_MESSAGE: &str = "new_message";
    pub const GAME_ACTION: &str = "game_action";
    pub const UPDATE_STATUS: &str = "UPDATE_STATUS";
    pub const GAME_ACTION_RESULT: &str = "GAME_ACTION_RESULT";
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every frame on the wire is an Envelope.
///
/// `#[serde(rename = "type")]` is needed because `type` is a Rust keyword;
/// the field is called `kind` in code and `type` in JSON.
///
/// The payload is kept as an opaque [`Value`] at this level. Clients are
/// allowed to omit it (the browser client sends `{"type":"list_rooms"}`),
/// so `#[serde(default)]` turns a missing payload into `null`, which
/// [`InboundEvent::from_envelope`] treats like `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The event type tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// Event-specific data.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope by serializing `payload` under the given tag.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload can't be represented
    /// as JSON.
    pub fn new<T: Serialize>(
        kind: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: kind.into(),
            payload: serde_json::to_value(payload).map_err(ProtocolError::Encode)?,
        })
    }

    /// Builds an envelope with an empty object payload.
    pub fn empty(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Object(Map::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One of the five moves a player can submit in a round.
///
/// Serialized in upper case (`"ADVANCE"`), matching what clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Wait,
    Retreat,
    Advance,
    Attack,
    Counter,
}

impl Action {
    /// Every action, in a fixed order. Handy for exhaustive tests.
    pub const ALL: [Action; 5] = [
        Action::Wait,
        Action::Retreat,
        Action::Advance,
        Action::Attack,
        Action::Counter,
    ];

    /// The wire name of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "WAIT",
            Self::Retreat => "RETREAT",
            Self::Advance => "ADVANCE",
            Self::Attack => "ATTACK",
            Self::Counter => "COUNTER",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// `init_client`: binds the session's player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitClient {
    pub player_id: String,
}

/// `join_room`: moves the session into a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    pub room: String,
}

/// `send_message`: a chat line for the sender's current room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub message: String,
    #[serde(default)]
    pub from: String,
}

/// `game_action`: one player's move for the current round.
///
/// `room` and `player_id` are informational. The server resolves both from
/// the sending session, so they default to empty when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub player_id: String,
    pub action: Action,
}

// ---------------------------------------------------------------------------
// InboundEvent
// ---------------------------------------------------------------------------

/// A validated client event: one variant per supported type tag.
///
/// Built with [`InboundEvent::from_envelope`]. An unrecognised tag becomes
/// [`ProtocolError::UnknownEventType`]; a recognised tag whose payload has
/// the wrong shape becomes [`ProtocolError::InvalidPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    InitClient(InitClient),
    JoinRoom(JoinRoom),
    ListRooms,
    LeaveRoom,
    SendMessage(SendMessage),
    GameAction(GameAction),
}

impl InboundEvent {
    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitClient(_) => kinds::INIT_CLIENT,
            Self::JoinRoom(_) => kinds::JOIN_ROOM,
            Self::ListRooms => kinds::LIST_ROOMS,
            Self::LeaveRoom => kinds::LEAVE_ROOM,
            Self::SendMessage(_) => kinds::SEND_MESSAGE,
            Self::GameAction(_) => kinds::GAME_ACTION,
        }
    }

    /// Validates an envelope into a typed event.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownEventType`] for an unsupported tag
    /// - [`ProtocolError::InvalidPayload`] for a malformed payload
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload } = envelope;
        let payload = match payload {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        match kind.as_str() {
            kinds::INIT_CLIENT => {
                let init: InitClient = parse_payload(&kind, payload)?;
                if init.player_id.trim().is_empty() {
                    return Err(invalid(&kind, "playerId must not be empty"));
                }
                Ok(Self::InitClient(init))
            }
            kinds::JOIN_ROOM => {
                let join: JoinRoom = parse_payload(&kind, payload)?;
                if join.room.trim().is_empty() {
                    return Err(invalid(&kind, "room must not be empty"));
                }
                Ok(Self::JoinRoom(join))
            }
            kinds::LIST_ROOMS => Ok(Self::ListRooms),
            kinds::LEAVE_ROOM => Ok(Self::LeaveRoom),
            kinds::SEND_MESSAGE => {
                parse_payload(&kind, payload).map(Self::SendMessage)
            }
            kinds::GAME_ACTION => {
                parse_payload(&kind, payload).map(Self::GameAction)
            }
            _ => Err(ProtocolError::UnknownEventType(kind)),
        }
    }
}

impl TryFrom<Envelope> for InboundEvent {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        Self::from_envelope(envelope)
    }
}

fn parse_payload<T: DeserializeOwned>(
    kind: &str,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        kind: kind.to_owned(),
        source,
    })
}

fn invalid(kind: &str, reason: &str) -> ProtocolError {
    ProtocolError::InvalidPayload {
        kind: kind.to_owned(),
        source: serde_json::Error::custom(reason),
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// `init_client` acknowledgement: echoes the bound identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInitialized {
    pub player_id: String,
}

/// `join_room` / `leave_room` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAck {
    pub room: String,
}

/// `list_rooms` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomList {
    pub rooms: Vec<String>,
}

/// `UPDATE_STATUS`: a human-readable status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// `new_message`: a chat line stamped by the server.
///
/// `sent` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub message: String,
    pub from: String,
    pub sent: u64,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(value: Value) -> Envelope {
        serde_json::from_value(value).expect("valid envelope")
    }

    // =====================================================================
    // Envelope
    // =====================================================================

    #[test]
    fn test_envelope_missing_payload_defaults_to_null() {
        let e = env(json!({ "type": "list_rooms" }));
        assert!(e.payload.is_null());
    }

    #[test]
    fn test_envelope_serializes_kind_as_type() {
        let e = Envelope::new(kinds::UPDATE_STATUS, &StatusUpdate {
            status: "ok".into(),
        })
        .unwrap();
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v, json!({ "type": "UPDATE_STATUS", "payload": { "status": "ok" } }));
    }

    // =====================================================================
    // Action
    // =====================================================================

    #[test]
    fn test_action_wire_names() {
        for action in Action::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn test_action_rejects_lowercase() {
        assert!(serde_json::from_str::<Action>("\"wait\"").is_err());
    }

    // =====================================================================
    // InboundEvent
    // =====================================================================

    #[test]
    fn test_inbound_init_client() {
        let ev = InboundEvent::from_envelope(env(json!({
            "type": "init_client",
            "payload": { "playerId": "abc" }
        })))
        .unwrap();
        assert_eq!(
            ev,
            InboundEvent::InitClient(InitClient { player_id: "abc".into() })
        );
        assert_eq!(ev.kind(), "init_client");
    }

    #[test]
    fn test_inbound_init_client_empty_id_is_invalid() {
        let err = InboundEvent::from_envelope(env(json!({
            "type": "init_client",
            "payload": { "playerId": "  " }
        })))
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
    }

    #[test]
    fn test_inbound_join_room_ignores_extra_fields() {
        let ev = InboundEvent::from_envelope(env(json!({
            "type": "join_room",
            "payload": { "room": "default", "playerId": "abc" }
        })))
        .unwrap();
        assert_eq!(ev, InboundEvent::JoinRoom(JoinRoom { room: "default".into() }));
    }

    #[test]
    fn test_inbound_list_rooms_without_payload() {
        let ev = InboundEvent::from_envelope(env(json!({ "type": "list_rooms" }))).unwrap();
        assert_eq!(ev, InboundEvent::ListRooms);
    }

    #[test]
    fn test_inbound_leave_room_accepts_chat_shaped_payload() {
        let ev = InboundEvent::from_envelope(env(json!({
            "type": "leave_room",
            "payload": { "message": "bye", "from": "abc" }
        })))
        .unwrap();
        assert_eq!(ev, InboundEvent::LeaveRoom);
    }

    #[test]
    fn test_inbound_game_action() {
        let ev = InboundEvent::from_envelope(env(json!({
            "type": "game_action",
            "payload": { "room": "r", "playerId": "p", "action": "COUNTER" }
        })))
        .unwrap();
        match ev {
            InboundEvent::GameAction(a) => {
                assert_eq!(a.action, Action::Counter);
                assert_eq!(a.room, "r");
                assert_eq!(a.player_id, "p");
            }
            other => panic!("expected GameAction, got {other:?}"),
        }
    }

    #[test]
    fn test_inbound_game_action_unknown_action_is_invalid() {
        let err = InboundEvent::from_envelope(env(json!({
            "type": "game_action",
            "payload": { "action": "FIREBALL" }
        })))
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { ref kind, .. } if kind == "game_action"));
    }

    #[test]
    fn test_inbound_send_message_missing_message_is_invalid() {
        let err = InboundEvent::from_envelope(env(json!({
            "type": "send_message",
            "payload": { "from": "abc" }
        })))
        .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
    }

    #[test]
    fn test_inbound_unknown_type_is_distinct_error() {
        let err = InboundEvent::try_from(env(json!({
            "type": "create_room",
            "payload": {}
        })))
        .unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEventType(ref t) if t == "create_room"));
    }

    // =====================================================================
    // Outbound payloads
    // =====================================================================

    #[test]
    fn test_client_initialized_uses_camel_case() {
        let v = serde_json::to_value(ClientInitialized { player_id: "x".into() }).unwrap();
        assert_eq!(v, json!({ "playerId": "x" }));
    }

    #[test]
    fn test_new_message_shape() {
        let v = serde_json::to_value(NewMessage {
            message: "hi".into(),
            from: "abc".into(),
            sent: 42,
        })
        .unwrap();
        assert_eq!(v, json!({ "message": "hi", "from": "abc", "sent": 42 }));
    }
}
