//! Session error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// The precondition an operation violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SessionErrorKind {
    /// Unknown session id.
    #[display("NotFound")]
    NotFound,
    /// Mode is not one of the supported values.
    #[display("InvalidMode")]
    InvalidMode,
    /// Operation not valid for the current lifecycle status.
    #[display("InvalidState")]
    InvalidState,
    /// Actor holds neither seat.
    #[display("NotParticipant")]
    NotParticipant,
    /// Actor's mark is not on turn.
    #[display("NotYourTurn")]
    NotYourTurn,
    /// Target cell occupied or out of bounds.
    #[display("InvalidMove")]
    InvalidMove,
    /// Participant id does not resolve in the directory.
    #[display("UnknownParticipant")]
    UnknownParticipant,
}

impl std::error::Error for SessionErrorKind {}

/// Session error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{}: {} at {}:{}", kind, message, file, line)]
pub struct SessionError {
    /// Which precondition failed.
    pub kind: SessionErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl SessionError {
    /// Creates a new session error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SessionErrorKind {
        self.kind
    }
}
