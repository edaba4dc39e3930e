//! Round resolution rules.
//!
//! Everything in here is pure and synchronous: the room actor calls
//! [`resolve_round`] once both players have submitted, and calls
//! [`evaluate`] once per viewer afterwards. No I/O, no locks, no clocks.
//!
//! A round goes through three steps:
//!
//! 1. **Intent**: each action maps to a target cell and a fixed energy
//!    cost (WAIT +1, RETREAT −1, ADVANCE −1, ATTACK/COUNTER stay put).
//! 2. **Reconciliation**: both targets are checked against each other so
//!    the two fighters never end up on the same cell ([`reconcile`]).
//! 3. **Combat**: ATTACK and COUNTER are settled on the post-movement
//!    positions.

use serde::{Deserialize, Serialize};
use skirmish_protocol::Action;

/// Damage of a landed ATTACK.
pub const ATTACK_DAMAGE: i32 = 3;
/// Damage of a landed ATTACK made right after an ADVANCE.
pub const ADVANCED_ATTACK_DAMAGE: i32 = 6;
/// Cost of an ATTACK that misses or is blocked.
pub const WHIFF_PENALTY: i32 = 1;
/// Cost of a COUNTER that has nothing to reflect.
pub const COUNTER_PENALTY: i32 = 2;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Which side of the line a player fights from.
///
/// Slot 1 starts on the low side and advances toward higher cells; slot 2
/// mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// `1` or `2`, as shown to clients.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// The step an ADVANCE takes for this slot.
    pub fn forward(self) -> i32 {
        match self {
            Self::One => 1,
            Self::Two => -1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

/// One fighter on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub pos: i32,
    /// May drop to zero or below; the game ends on the next evaluation.
    pub energy: i32,
    /// Action submitted for the round in progress, if any.
    pub pending: Option<Action>,
    /// Action resolved in the most recent round.
    pub last_action: Option<Action>,
    /// Set by ADVANCE; doubles the next landed ATTACK.
    pub advanced: bool,
    pub slot: Slot,
}

impl PlayerState {
    pub fn new(slot: Slot, pos: i32, energy: i32) -> Self {
        Self {
            pos,
            energy,
            pending: None,
            last_action: None,
            advanced: false,
            slot,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// The cell a player wants to reach with `action`, clamped to the line.
pub fn intended_position(
    player: &PlayerState,
    action: Action,
    last_cell: i32,
) -> i32 {
    let step = match action {
        Action::Advance => player.slot.forward(),
        Action::Retreat => -player.slot.forward(),
        Action::Wait | Action::Attack | Action::Counter => 0,
    };
    (player.pos + step).clamp(0, last_cell)
}

/// Resolves two simultaneous moves so the fighters never share a cell.
///
/// Index 0 is slot 1, index 1 is slot 2. Rules, first match wins:
///
/// 1. Each wants the other's cell (a swap): nobody moves.
/// 2. Both want the same cell and it is neither current cell: slot 1
///    gets it, slot 2 stays.
/// 3. A player wants the other's cell while the other stays: that
///    player is blocked, the other moves as planned.
/// 4. Otherwise both moves apply.
pub fn reconcile(current: [i32; 2], intended: [i32; 2]) -> [i32; 2] {
    let [c1, c2] = current;
    let [i1, i2] = intended;

    if i1 == c2 && i2 == c1 {
        return current;
    }
    if i1 == i2 && i1 != c1 && i1 != c2 {
        return [i1, c2];
    }

    let first_blocked = i1 == c2 && i2 == c2;
    let second_blocked = i2 == c1 && i1 == c1;
    [
        if first_blocked { c1 } else { i1 },
        if second_blocked { c2 } else { i2 },
    ]
}

pub fn is_adjacent(a: i32, b: i32) -> bool {
    (a - b).abs() == 1
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Energy changes produced by one player's action in the combat step.
struct Strike {
    own_delta: i32,
    opponent_delta: i32,
    note: String,
}

fn strike(action: Action, advanced: bool, opponent: Action, adjacent: bool) -> Strike {
    let damage = if advanced {
        ADVANCED_ATTACK_DAMAGE
    } else {
        ATTACK_DAMAGE
    };

    match action {
        Action::Attack if !adjacent => Strike {
            own_delta: -WHIFF_PENALTY,
            opponent_delta: 0,
            note: format!("ATTACK missed: -{WHIFF_PENALTY} energy"),
        },
        Action::Attack if opponent == Action::Retreat => Strike {
            own_delta: -WHIFF_PENALTY,
            opponent_delta: 0,
            note: format!("ATTACK blocked by retreat: -{WHIFF_PENALTY} energy"),
        },
        Action::Attack if opponent == Action::Counter => Strike {
            own_delta: -damage,
            opponent_delta: 0,
            note: format!("ATTACK countered: took {damage} damage"),
        },
        Action::Attack => Strike {
            own_delta: 0,
            opponent_delta: -damage,
            note: format!("ATTACK hit for {damage} damage"),
        },
        Action::Counter if opponent == Action::Attack && adjacent => Strike {
            own_delta: 0,
            opponent_delta: 0,
            note: "COUNTER reflected the attack".to_string(),
        },
        Action::Counter => Strike {
            own_delta: -COUNTER_PENALTY,
            opponent_delta: 0,
            note: format!("COUNTER found nothing: -{COUNTER_PENALTY} energy"),
        },
        Action::Wait | Action::Retreat | Action::Advance => Strike {
            own_delta: 0,
            opponent_delta: 0,
            note: String::new(),
        },
    }
}

fn movement_note(action: Action, from: i32, to: i32) -> String {
    match action {
        Action::Wait => "WAIT: +1 energy".to_string(),
        Action::Retreat if from == to => "RETREAT blocked: -1 energy".to_string(),
        Action::Retreat => format!("RETREAT to {to}: -1 energy"),
        Action::Advance if from == to => {
            "ADVANCE blocked: -1 energy, double damage next attack".to_string()
        }
        Action::Advance => {
            format!("ADVANCE to {to}: -1 energy, double damage next attack")
        }
        Action::Attack | Action::Counter => String::new(),
    }
}

fn movement_cost(action: Action) -> i32 {
    match action {
        Action::Wait => 1,
        Action::Retreat | Action::Advance => -1,
        Action::Attack | Action::Counter => 0,
    }
}

/// Resolves one full round in place and returns a note per slot.
///
/// `players[0]` must be slot 1 and `players[1]` slot 2. `actions` holds
/// each slot's action for this round. On return positions and energy are
/// updated, `pending` is cleared, `last_action` records the action, and
/// `advanced` is set only for a player who advanced this round.
pub fn resolve_round(
    players: &mut [PlayerState; 2],
    actions: [Action; 2],
    last_cell: i32,
) -> [String; 2] {
    let current = [players[0].pos, players[1].pos];
    let intended = [
        intended_position(&players[0], actions[0], last_cell),
        intended_position(&players[1], actions[1], last_cell),
    ];
    let moved = reconcile(current, intended);
    let adjacent = is_adjacent(moved[0], moved[1]);

    let strikes = [
        strike(actions[0], players[0].advanced, actions[1], adjacent),
        strike(actions[1], players[1].advanced, actions[0], adjacent),
    ];

    let mut notes = [String::new(), String::new()];
    for i in 0..2 {
        let other = 1 - i;
        let player = &mut players[i];
        player.pos = moved[i];
        player.energy += movement_cost(actions[i])
            + strikes[i].own_delta
            + strikes[other].opponent_delta;
        player.advanced = actions[i] == Action::Advance;
        player.pending = None;
        player.last_action = Some(actions[i]);

        let movement = movement_note(actions[i], current[i], moved[i]);
        notes[i] = if strikes[i].note.is_empty() {
            movement
        } else {
            strikes[i].note.clone()
        };
    }
    notes
}

// ---------------------------------------------------------------------------
// Win evaluation
// ---------------------------------------------------------------------------

/// The result of a game from one viewer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ongoing,
    Win,
    Loss,
    Draw,
    WinOnEnergy,
    LossOnEnergy,
    DrawOnTurns,
}

impl Verdict {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// The winner line shown to the viewer; empty while the game runs.
    pub fn winner_text(self) -> &'static str {
        match self {
            Self::Ongoing => "",
            Self::Win => "You win!",
            Self::Loss => "Opponent wins!",
            Self::Draw | Self::DrawOnTurns => "Draw!",
            Self::WinOnEnergy => "You win by energy!",
            Self::LossOnEnergy => "Opponent wins by energy!",
        }
    }
}

/// Evaluates the game for a viewer with `own` energy against `opponent`.
///
/// Elimination is checked first; the turn limit only matters when nobody
/// has been eliminated.
pub fn evaluate(own: i32, opponent: i32, turn: u32, max_turns: u32) -> Verdict {
    match (own > 0, opponent > 0) {
        (true, false) => Verdict::Win,
        (false, true) => Verdict::Loss,
        (false, false) => Verdict::Draw,
        (true, true) if turn > max_turns => match own.cmp(&opponent) {
            std::cmp::Ordering::Greater => Verdict::WinOnEnergy,
            std::cmp::Ordering::Less => Verdict::LossOnEnergy,
            std::cmp::Ordering::Equal => Verdict::DrawOnTurns,
        },
        (true, true) => Verdict::Ongoing,
    }
}

// =========================================================================
// Tests
// =========================================================================
