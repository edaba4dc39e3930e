//! Room actor: an isolated Tokio task that owns one room's game.
//!
//! Every command is handled to completion before the next one is read, so
//! a round resolves exactly once no matter how many sessions submit at the
//! same moment. The actor stops on teardown (game over, or a seated player
//! leaving); commands still queued at that point fail with
//! [`GameError::Unavailable`].

use std::sync::atomic::{AtomicU64, Ordering};

use skirmish_protocol::Action;
use tokio::sync::{mpsc, oneshot};

use crate::{GameConfig, GameError, GameState, Seat, Submission};

/// Counter for telling successive games in the same room apart.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Result of joining a room's game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub seat: Seat,
    /// Room-wide status line after the join.
    pub status: String,
}

/// Result of leaving a room's game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The leaver held a slot.
    pub was_player: bool,
    /// The game was discarded because of this leave.
    pub torn_down: bool,
    /// The other seated player of a discarded game, if there was one.
    pub remaining_player: Option<String>,
}

/// Commands sent to a room actor. Each carries its own reply channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: String,
        reply: oneshot::Sender<JoinOutcome>,
    },
    Submit {
        player_id: String,
        action: Action,
        reply: oneshot::Sender<Result<Submission, GameError>>,
    },
    Leave {
        player_id: String,
        reply: oneshot::Sender<LeaveOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room: String,
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Identifies this particular game among all games ever hosted in the
    /// room.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn join(&self, player_id: &str) -> Result<JoinOutcome, GameError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Join {
                player_id: player_id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn submit(
        &self,
        player_id: &str,
        action: Action,
    ) -> Result<Submission, GameError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Submit {
                player_id: player_id.to_string(),
                action,
                reply,
            },
            rx,
        )
        .await?
    }

    pub async fn leave(&self, player_id: &str) -> Result<LeaveOutcome, GameError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Leave {
                player_id: player_id.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Copies the current game state.
    pub async fn snapshot(&self) -> Result<GameState, GameError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Snapshot { reply }, rx).await
    }

    async fn request<T>(
        &self,
        command: RoomCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, GameError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| GameError::Unavailable(self.room.clone()))?;
        rx.await.map_err(|_| GameError::Unavailable(self.room.clone()))
    }
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room", &self.room)
            .field("generation", &self.generation)
            .finish()
    }
}

struct RoomActor {
    generation: u64,
    game: GameState,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.game.room(), generation = self.generation, "game created");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { player_id, reply } => {
                    let seat = self.game.join(&player_id);
                    tracing::info!(
                        room = %self.game.room(),
                        %player_id,
                        ?seat,
                        phase = %self.game.phase(),
                        "player joined game"
                    );
                    let _ = reply.send(JoinOutcome {
                        seat,
                        status: self.game.status(),
                    });
                }
                RoomCommand::Submit {
                    player_id,
                    action,
                    reply,
                } => {
                    let result = self.game.submit(&player_id, action);
                    let finished =
                        matches!(&result, Ok(Submission::Resolved(round)) if round.finished);
                    let _ = reply.send(result);
                    if finished {
                        tracing::info!(
                            room = %self.game.room(),
                            turn = self.game.turn(),
                            "game over"
                        );
                        break;
                    }
                }
                RoomCommand::Leave { player_id, reply } => {
                    let was_player = self.game.remove(&player_id);
                    let remaining_player = if was_player {
                        self.game.player_ids().next().map(str::to_string)
                    } else {
                        None
                    };
                    let _ = reply.send(LeaveOutcome {
                        was_player,
                        torn_down: was_player,
                        remaining_player,
                    });
                    if was_player {
                        tracing::info!(
                            room = %self.game.room(),
                            %player_id,
                            "player left, game discarded"
                        );
                        break;
                    }
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.game.clone());
                }
            }
        }

        tracing::debug!(room = %self.game.room(), generation = self.generation, "room actor stopped");
    }
}

/// Spawns a room actor with a fresh game and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(room: &str, config: GameConfig, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

    let actor = RoomActor {
        generation,
        game: GameState::new(room, config),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room: room.to_string(),
        generation,
        sender: tx,
    }
}
