//! Session model: seats, lifecycle and outcome of a single match.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strictly_rules::{Board, Mark, MoveError, Verdict, apply_move, evaluate};
use tracing::{debug, instrument};

/// Unique identifier for a session.
pub type SessionId = String;

/// Unique identifier for a participant.
pub type ParticipantId = String;

/// Reserved participant id bound to the automated seat.
pub const AUTOMATED_PARTICIPANT: &str = "AI";

/// Whether the second seat is a human or the move policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Mode {
    /// Two human participants.
    #[serde(rename = "PVP")]
    #[strum(serialize = "PVP")]
    TwoHuman,
    /// Human against the automated policy.
    #[serde(rename = "PVC")]
    #[strum(serialize = "PVC")]
    VsAutomated,
}

/// Lifecycle status. Transitions are one-way.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Two-human session waiting for its second participant.
    #[serde(rename = "WAITING_FOR_PLAYER")]
    #[strum(serialize = "WAITING_FOR_PLAYER")]
    AwaitingSecondParticipant,
    /// Moves are being accepted.
    InProgress,
    /// Terminal; no further moves.
    Finished,
}

/// Final result of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The mark completed a line.
    Winner(Mark),
    /// Full board, no line.
    Draw,
}

impl Outcome {
    /// Wire form: `"X"`, `"O"` or `"DRAW"`.
    pub fn as_wire(&self) -> String {
        match self {
            Outcome::Winner(mark) => mark.to_string(),
            Outcome::Draw => "DRAW".to_string(),
        }
    }
}

/// One match: the aggregate mutated by the orchestrator.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Session {
    /// Immutable unique id.
    id: SessionId,
    /// Two-human or human-vs-automated.
    mode: Mode,
    /// Current board.
    board: Board,
    /// Participant holding the first mark (always the creator).
    player_x: ParticipantId,
    /// Participant holding the second mark, once seated.
    player_o: Option<ParticipantId>,
    /// Mark on turn; `None` unless in progress.
    turn: Option<Mark>,
    /// Lifecycle status.
    status: Status,
    /// Set exactly when the session finishes.
    outcome: Option<Outcome>,
    /// Creation time.
    created_at: DateTime<Utc>,
    /// Last accepted mutation.
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `creator`, who always takes the first mark.
    ///
    /// Two-human sessions wait for a second participant; sessions against
    /// the automated policy start in progress with the automated seat filled.
    #[instrument(skip(id, creator), fields(session_id = %id, creator = %creator))]
    pub fn open(id: SessionId, creator: ParticipantId, mode: Mode) -> Self {
        let now = Utc::now();
        let (player_o, status, turn) = match mode {
            Mode::TwoHuman => (None, Status::AwaitingSecondParticipant, None),
            Mode::VsAutomated => (
                Some(AUTOMATED_PARTICIPANT.to_string()),
                Status::InProgress,
                Some(Mark::X),
            ),
        };

        debug!(?status, "Opened session");
        Self {
            id,
            mode,
            board: Board::new(),
            player_x: creator,
            player_o,
            turn,
            status,
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the mark held by `participant`, if seated.
    pub fn mark_of(&self, participant: &str) -> Option<Mark> {
        if self.player_x == participant {
            Some(Mark::X)
        } else if self.player_o.as_deref() == Some(participant) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Returns the participant id seated at `mark`.
    pub fn participant(&self, mark: Mark) -> Option<&str> {
        match mark {
            Mark::X => Some(self.player_x.as_str()),
            Mark::O => self.player_o.as_deref(),
        }
    }

    /// Returns the mark played by the automated policy, if any.
    pub fn automated_mark(&self) -> Option<Mark> {
        match self.mode {
            Mode::VsAutomated => Some(Mark::O),
            Mode::TwoHuman => None,
        }
    }

    /// Returns true while moves are being accepted.
    pub fn is_in_progress(&self) -> bool {
        self.status == Status::InProgress
    }

    /// Seats `participant` at the second mark and starts play.
    pub(crate) fn seat_second(&mut self, participant: ParticipantId) {
        self.player_o = Some(participant);
        self.status = Status::InProgress;
        self.turn = Some(Mark::X);
    }

    /// Places `mark` at `(row, col)` and advances the lifecycle.
    ///
    /// Turn and status checks belong to the caller; this only enforces cell
    /// legality. A terminal verdict finishes the session and clears the turn.
    pub(crate) fn play(&mut self, mark: Mark, row: i32, col: i32) -> Result<Verdict, MoveError> {
        self.board = apply_move(&self.board, row, col, mark)?;

        let verdict = evaluate(&self.board);
        match verdict {
            Verdict::Ongoing => self.turn = Some(mark.opponent()),
            Verdict::Won(winner) => self.finish(Outcome::Winner(winner)),
            Verdict::Draw => self.finish(Outcome::Draw),
        }
        Ok(verdict)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.status = Status::Finished;
        self.outcome = Some(outcome);
        self.turn = None;
    }

    /// Stamps the last-update time.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
