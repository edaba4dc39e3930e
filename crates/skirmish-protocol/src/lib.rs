//! Wire protocol for Skirmish.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`InboundEvent`], [`Action`], payload
//!   structs): the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (text) → Protocol (Envelope → InboundEvent) → Hub (routing)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Action, ClientInitialized, Envelope, GameAction, InboundEvent, InitClient,
    JoinRoom, NewMessage, RoomAck, RoomList, SendMessage, StatusUpdate, kinds,
};
