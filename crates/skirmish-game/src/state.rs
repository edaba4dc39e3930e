//! A room's game: seats, turn counter, and the per-viewer snapshot sent to
//! clients.

use serde::{Deserialize, Serialize};
use skirmish_protocol::Action;

use crate::engine::{self, PlayerState, Slot, Verdict};
use crate::{GameConfig, GameError, GamePhase};

pub const STATUS_AWAITING_ARRIVAL: &str = "Waiting for opponent to arrive";
pub const STATUS_AWAITING_ACTION: &str = "Waiting for opponent to act";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a session ended up in a room's game after joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    /// Holds a slot. `rejoined` is `true` if the player already held it.
    Player { slot: Slot, rejoined: bool },
    /// Both slots are taken by other players.
    Spectator,
}

/// What happened to a submitted action.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Only one player is seated; the action was not recorded.
    AwaitingOpponentArrival,
    /// Recorded; the opponent has not acted yet this round.
    AwaitingOpponentAction,
    /// Both actions were in, and the round resolved.
    Resolved(RoundResult),
}

impl Submission {
    /// Status line for the submitter while the round is still open.
    pub fn pending_status(&self) -> Option<&'static str> {
        match self {
            Self::AwaitingOpponentArrival => Some(STATUS_AWAITING_ARRIVAL),
            Self::AwaitingOpponentAction => Some(STATUS_AWAITING_ACTION),
            Self::Resolved(_) => None,
        }
    }
}

/// The game right after a round resolved.
#[derive(Debug, Clone)]
pub struct RoundResult {
    pub snapshot: GameState,
    /// `true` if the round ended the game. The room's game is gone.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One fighter as seen by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub pos: i32,
    pub energy: i32,
    /// Action resolved in the latest round, or `""`.
    pub action: String,
    pub advanced: bool,
    pub player: u8,
}

impl From<&PlayerState> for PlayerView {
    fn from(state: &PlayerState) -> Self {
        Self {
            pos: state.pos,
            energy: state.energy,
            action: state
                .last_action
                .map(|a| a.as_str().to_string())
                .unwrap_or_default(),
            advanced: state.advanced,
            player: state.slot.number(),
        }
    }
}

/// The two logical seats of a personalized view. Raw player ids never
/// appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStates {
    pub you: PlayerView,
    pub opponent: PlayerView,
}

/// `GAME_ACTION_RESULT` payload: the game from one viewer's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub turn: u32,
    pub max_turns: u32,
    pub last_action: String,
    pub game_over: bool,
    pub winner: String,
    pub status: String,
    pub player_states: PlayerStates,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Seated {
    player_id: String,
    state: PlayerState,
}

/// One room's game.
///
/// Holds at most two seated players, slot 1 first. Mutated only by the
/// room actor that owns it.
#[derive(Debug, Clone)]
pub struct GameState {
    room: String,
    config: GameConfig,
    turn: u32,
    last_action: String,
    seats: Vec<Seated>,
}

impl GameState {
    pub fn new(room: impl Into<String>, config: GameConfig) -> Self {
        Self {
            room: room.into(),
            config,
            turn: 1,
            last_action: String::new(),
            seats: Vec::with_capacity(2),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn max_turns(&self) -> u32 {
        self.config.max_turns
    }

    pub fn last_action(&self) -> &str {
        &self.last_action
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// Ids of the seated players, slot 1 first.
    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.seats.iter().map(|s| s.player_id.as_str())
    }

    /// The seated player's state, if `player_id` holds a slot.
    pub fn player(&self, player_id: &str) -> Option<&PlayerState> {
        self.seat_index(player_id).map(|i| &self.seats[i].state)
    }

    pub fn phase(&self) -> GamePhase {
        match self.seats.len() {
            0 => GamePhase::NoGame,
            1 => GamePhase::AwaitingSecondPlayer,
            _ if self.verdict_for_slot_one().is_terminal() => GamePhase::GameOver,
            _ => GamePhase::AwaitingActions,
        }
    }

    /// Room-wide status line for the current phase.
    pub fn status(&self) -> String {
        match self.phase() {
            GamePhase::NoGame | GamePhase::AwaitingSecondPlayer => {
                STATUS_AWAITING_ARRIVAL.to_string()
            }
            GamePhase::AwaitingActions => {
                format!("Turn {}: choose your action", self.turn)
            }
            GamePhase::GameOver => "Game over".to_string(),
        }
    }

    /// Seats `player_id` in the next free slot, or as a spectator when
    /// both slots are taken.
    pub fn join(&mut self, player_id: &str) -> Seat {
        if let Some(i) = self.seat_index(player_id) {
            return Seat::Player {
                slot: self.seats[i].state.slot,
                rejoined: true,
            };
        }
        let slot = match self.seats.len() {
            0 => Slot::One,
            1 => Slot::Two,
            _ => return Seat::Spectator,
        };
        let pos = self.config.start_positions[slot.index()];
        self.seats.push(Seated {
            player_id: player_id.to_string(),
            state: PlayerState::new(slot, pos, self.config.starting_energy),
        });
        Seat::Player {
            slot,
            rejoined: false,
        }
    }

    /// Records `action` for `player_id` and resolves the round once both
    /// players have acted.
    ///
    /// # Errors
    /// [`GameError::NotAPlayer`] if `player_id` holds no slot. State is
    /// left untouched in that case.
    pub fn submit(
        &mut self,
        player_id: &str,
        action: Action,
    ) -> Result<Submission, GameError> {
        let index = self.seat_index(player_id).ok_or_else(|| GameError::NotAPlayer {
            player_id: player_id.to_string(),
            room: self.room.clone(),
        })?;

        if self.seats.len() < 2 {
            return Ok(Submission::AwaitingOpponentArrival);
        }

        self.seats[index].state.pending = Some(action);
        let (Some(first), Some(second)) =
            (self.seats[0].state.pending, self.seats[1].state.pending)
        else {
            return Ok(Submission::AwaitingOpponentAction);
        };

        self.resolve([first, second]);
        let finished = self.verdict_for_slot_one().is_terminal();
        Ok(Submission::Resolved(RoundResult {
            snapshot: self.clone(),
            finished,
        }))
    }

    /// Builds the snapshot `viewer_id` should receive.
    ///
    /// Seated players see themselves as `you`. Anyone else watches from
    /// slot 1's side.
    pub fn view_for(&self, viewer_id: &str) -> GameView {
        let you_index = self.seat_index(viewer_id).unwrap_or(0);
        let you = self.seats.get(you_index).map(|s| &s.state);
        let opponent = self.seats.get(1 - you_index).map(|s| &s.state);

        let verdict = match (you, opponent) {
            (Some(you), Some(opponent)) => engine::evaluate(
                you.energy,
                opponent.energy,
                self.turn,
                self.config.max_turns,
            ),
            _ => Verdict::Ongoing,
        };
        let winner = verdict.winner_text().to_string();
        let status = if verdict.is_terminal() {
            format!("Game over: {winner}")
        } else {
            self.status()
        };

        GameView {
            turn: self.turn,
            max_turns: self.config.max_turns,
            last_action: self.last_action.clone(),
            game_over: verdict.is_terminal(),
            winner,
            status,
            player_states: PlayerStates {
                you: you.map(PlayerView::from).unwrap_or_default(),
                opponent: opponent.map(PlayerView::from).unwrap_or_default(),
            },
        }
    }

    /// Removes `player_id` from its slot. Returns `true` if it held one.
    pub fn remove(&mut self, player_id: &str) -> bool {
        match self.seat_index(player_id) {
            Some(i) => {
                self.seats.remove(i);
                true
            }
            None => false,
        }
    }

    fn seat_index(&self, player_id: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.player_id == player_id)
    }

    fn verdict_for_slot_one(&self) -> Verdict {
        match self.seats.as_slice() {
            [first, second] => engine::evaluate(
                first.state.energy,
                second.state.energy,
                self.turn,
                self.config.max_turns,
            ),
            _ => Verdict::Ongoing,
        }
    }

    fn resolve(&mut self, actions: [Action; 2]) {
        let mut fighters = [self.seats[0].state.clone(), self.seats[1].state.clone()];
        let notes = engine::resolve_round(&mut fighters, actions, self.config.last_cell());
        let [first, second] = fighters;
        self.seats[0].state = first;
        self.seats[1].state = second;

        self.last_action = format!("P1: {}. P2: {}.", notes[0], notes[1]);
        self.turn += 1;

        tracing::debug!(
            room = %self.room,
            turn = self.turn,
            last_action = %self.last_action,
            "round resolved"
        );
    }
}

// =========================================================================
// Tests
// =========================================================================
