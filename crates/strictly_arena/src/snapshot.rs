//! Serializable projections of a session.

use crate::session::{Mode, ParticipantId, Session, SessionId, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strictly_rules::{Board, Mark};

/// State pushed to observers and returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Session id.
    pub game_id: SessionId,
    /// Session mode.
    pub mode: Mode,
    /// Board as a grid of `""`, `"X"` and `"O"`.
    pub board: Board,
    /// Mark on turn while in progress.
    pub current_turn: Option<Mark>,
    /// Lifecycle status.
    pub status: Status,
    /// `"X"`, `"O"`, `"DRAW"`, or empty while undecided.
    pub winner: String,
    /// Participant holding X.
    pub player_x_id: ParticipantId,
    /// Participant holding O, once seated.
    pub player_o_id: Option<ParticipantId>,
    /// Last accepted mutation.
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for Snapshot {
    fn from(session: &Session) -> Self {
        Self {
            game_id: session.id().clone(),
            mode: *session.mode(),
            board: *session.board(),
            current_turn: *session.turn(),
            status: *session.status(),
            winner: session
                .outcome()
                .map(|outcome| outcome.as_wire())
                .unwrap_or_default(),
            player_x_id: session.player_x().clone(),
            player_o_id: session.player_o().clone(),
            updated_at: *session.updated_at(),
        }
    }
}

/// Lobby listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id.
    pub game_id: SessionId,
    /// Session mode.
    pub mode: Mode,
    /// Lifecycle status.
    pub status: Status,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Creator identity; blank when it could not be resolved.
    pub created_by: CreatorInfo,
}

/// Creator display data attached to a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorInfo {
    /// Creator participant id.
    pub player_id: String,
    /// Creator display name.
    pub name: String,
}
