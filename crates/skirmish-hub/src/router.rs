//! Event routing: one handler per inbound event type.
//!
//! Handlers run on the connection task that received the event. They
//! mutate session and game state, then enqueue replies; they never write
//! to a connection directly.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use skirmish_game::{GameState, Seat, Submission};
use skirmish_protocol::{
    ClientInitialized, Envelope, GameAction, InboundEvent, InitClient, JoinRoom, NewMessage,
    RoomAck, RoomList, SendMessage, StatusUpdate, kinds,
};

use crate::{Hub, HubError, Session};

/// Status sent to the rest of the room when a seated player leaves.
pub const STATUS_OPPONENT_LEFT: &str = "Opponent left the room";

impl Hub {
    /// Validates `envelope` and routes it to its handler.
    ///
    /// # Errors
    /// [`HubError::Protocol`] for an unknown type tag or a malformed
    /// payload, or whatever the handler returns.
    pub async fn dispatch_envelope(
        &self,
        session: &Arc<Session>,
        envelope: Envelope,
    ) -> Result<(), HubError> {
        let event = InboundEvent::from_envelope(envelope)?;
        self.dispatch(session, event).await
    }

    /// Routes a validated event from `session` to its handler.
    pub async fn dispatch(
        &self,
        session: &Arc<Session>,
        event: InboundEvent,
    ) -> Result<(), HubError> {
        tracing::debug!(session_id = %session.id(), kind = event.kind(), "dispatching event");

        match event {
            InboundEvent::InitClient(init) => self.handle_init_client(session, init).await,
            InboundEvent::JoinRoom(join) => self.handle_join_room(session, join).await,
            InboundEvent::ListRooms => self.handle_list_rooms(session).await,
            InboundEvent::LeaveRoom => self.handle_leave_room(session).await,
            InboundEvent::SendMessage(msg) => self.handle_send_message(session, msg).await,
            InboundEvent::GameAction(action) => self.handle_game_action(session, action).await,
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    async fn handle_init_client(
        &self,
        session: &Session,
        init: InitClient,
    ) -> Result<(), HubError> {
        let room = session.room().await;
        if !room.is_empty() {
            return Err(HubError::IdentityLocked { room });
        }

        self.claim_player_id(session, &init.player_id).await?;
        tracing::info!(session_id = %session.id(), player_id = %init.player_id, "client initialized");

        let ack = ClientInitialized {
            player_id: init.player_id,
        };
        self.send_to(session, Envelope::new(kinds::INIT_CLIENT, &ack)?)
            .await;
        Ok(())
    }

    async fn handle_join_room(&self, session: &Session, join: JoinRoom) -> Result<(), HubError> {
        let current = session.room().await;
        if !current.is_empty() && current != join.room {
            self.leave_current_room(session).await;
        }

        session.set_room(join.room.clone()).await;
        let player_id = session.player_id().await;
        let outcome = self.games().join(&join.room, &player_id).await?;
        tracing::info!(
            session_id = %session.id(),
            %player_id,
            room = %join.room,
            seat = ?outcome.seat,
            "joined room"
        );

        let ack = RoomAck {
            room: join.room.clone(),
        };
        self.send_to(session, Envelope::new(kinds::JOIN_ROOM, &ack)?)
            .await;
        self.send_room_list(session).await?;

        let status = StatusUpdate {
            status: outcome.status,
        };
        self.send_to_room(&join.room, Envelope::new(kinds::UPDATE_STATUS, &status)?)
            .await;

        if outcome.seat == Seat::Spectator {
            let snapshot = self.games().snapshot(&join.room).await?;
            let view = snapshot.view_for(&player_id);
            self.send_to(session, Envelope::new(kinds::GAME_ACTION_RESULT, &view)?)
                .await;
        }
        Ok(())
    }

    async fn handle_list_rooms(&self, session: &Session) -> Result<(), HubError> {
        self.send_room_list(session).await
    }

    async fn handle_leave_room(&self, session: &Session) -> Result<(), HubError> {
        let room = self.leave_current_room(session).await.unwrap_or_default();
        let ack = RoomAck { room };
        self.send_to(session, Envelope::new(kinds::LEAVE_ROOM, &ack)?)
            .await;
        Ok(())
    }

    async fn handle_send_message(
        &self,
        session: &Session,
        msg: SendMessage,
    ) -> Result<(), HubError> {
        let room = session.room().await;
        let from = if msg.from.is_empty() {
            session.player_id().await
        } else {
            msg.from
        };
        let chat = NewMessage {
            message: msg.message,
            from,
            sent: unix_millis(),
        };
        let delivered = self
            .send_to_room(&room, Envelope::new(kinds::NEW_MESSAGE, &chat)?)
            .await;
        tracing::debug!(session_id = %session.id(), room = %room, delivered, "chat message");
        Ok(())
    }

    async fn handle_game_action(
        &self,
        session: &Session,
        action: GameAction,
    ) -> Result<(), HubError> {
        let room = session.room().await;
        if room.is_empty() {
            return Err(HubError::NotInRoom(session.id()));
        }
        if !action.room.is_empty() && action.room != room {
            tracing::debug!(
                session_id = %session.id(),
                claimed = %action.room,
                room = %room,
                "game action names another room, using the session's room"
            );
        }

        let player_id = session.player_id().await;
        let submission = self
            .games()
            .submit(&room, &player_id, action.action)
            .await?;

        match submission {
            Submission::Resolved(round) => {
                self.broadcast_round(&room, &round.snapshot).await?;
                if round.finished {
                    tracing::info!(room = %room, turn = round.snapshot.turn(), "game finished");
                }
            }
            pending => {
                if let Some(status) = pending.pending_status() {
                    let status = StatusUpdate {
                        status: status.to_string(),
                    };
                    self.send_to(session, Envelope::new(kinds::UPDATE_STATUS, &status)?)
                        .await;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Takes `session` out of its room and the room's game.
    ///
    /// Returns the room it left, or `None` if it was in the lobby. If the
    /// session held a slot, the game is discarded, the rest of the room is
    /// told, and the other seated player starts over in slot 1 of a fresh
    /// game.
    pub(crate) async fn leave_current_room(&self, session: &Session) -> Option<String> {
        let room = session.set_room(String::new()).await;
        if room.is_empty() {
            return None;
        }

        let player_id = session.player_id().await;
        match self.games().leave(&room, &player_id).await {
            Ok(outcome) if outcome.torn_down => {
                self.send_status_to_room(&room, STATUS_OPPONENT_LEFT.to_string())
                    .await;
                if let Some(remaining) = outcome.remaining_player {
                    self.reseat(&room, &remaining).await;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%player_id, room = %room, error = %e, "leaving game failed");
            }
        }

        tracing::info!(session_id = %session.id(), %player_id, room = %room, "left room");
        Some(room)
    }

    /// Seats `player_id` in a new game for `room` if a session with that
    /// id is still in the room.
    async fn reseat(&self, room: &str, player_id: &str) {
        let mut present = false;
        for member in self.sessions_in_room(room).await {
            if member.player_id().await == player_id {
                present = true;
                break;
            }
        }
        if !present {
            return;
        }

        match self.games().join(room, player_id).await {
            Ok(outcome) => {
                tracing::info!(%player_id, room = %room, seat = ?outcome.seat, "player reseated");
                self.send_status_to_room(room, outcome.status).await;
            }
            Err(e) => {
                tracing::warn!(%player_id, room = %room, error = %e, "reseating failed");
            }
        }
    }

    async fn send_status_to_room(&self, room: &str, status: String) {
        match Envelope::new(kinds::UPDATE_STATUS, &StatusUpdate { status }) {
            Ok(envelope) => {
                self.send_to_room(room, envelope).await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode status"),
        }
    }

    async fn send_room_list(&self, session: &Session) -> Result<(), HubError> {
        let list = RoomList {
            rooms: self.list_rooms().await,
        };
        self.send_to(session, Envelope::new(kinds::LIST_ROOMS, &list)?)
            .await;
        Ok(())
    }

    /// Sends every session in `room` its own view of the round.
    async fn broadcast_round(&self, room: &str, snapshot: &GameState) -> Result<(), HubError> {
        for member in self.sessions_in_room(room).await {
            let view = snapshot.view_for(&member.player_id().await);
            member
                .send(Envelope::new(kinds::GAME_ACTION_RESULT, &view)?)
                .await;
        }
        Ok(())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
