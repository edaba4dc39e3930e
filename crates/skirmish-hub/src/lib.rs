//! Session registry and event routing for Skirmish.
//!
//! This crate is the middle of the stack:
//!
//! 1. **Sessions**: who is connected, which room they are in, and the
//!    queue their outbound events go through ([`Session`])
//! 2. **Registry**: every live session plus the room view derived from
//!    them ([`Hub`])
//! 3. **Routing**: one handler per inbound event type
//!    ([`Hub::dispatch`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection pumps (above)  ← feed decoded envelopes in, drain queues out
//!     ↕
//! Hub (this crate)          ← sessions, rooms, handlers
//!     ↕
//! Game (below)              ← one room actor per room with a live game
//! ```

mod error;
mod hub;
mod router;
mod session;

pub use error::HubError;
pub use hub::{Hub, HubConfig};
pub use router::STATUS_OPPONENT_LEFT;
pub use session::{DEFAULT_QUEUE_CAPACITY, Session, SessionId};
