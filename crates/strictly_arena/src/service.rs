//! Session orchestration: the state machine over registry records.

use crate::directory::ParticipantDirectory;
use crate::error::{SessionError, SessionErrorKind};
use crate::hub::HubHandle;
use crate::registry::{RegistryError, SessionFilter, SessionRegistry};
use crate::session::{AUTOMATED_PARTICIPANT, Mode, Session, Status};
use crate::snapshot::{CreatorInfo, SessionSummary, Snapshot};
use derive_new::new;
use std::sync::Arc;
use strictly_rules::{Mark, MovePolicy, Verdict};
use tracing::{debug, info, instrument, warn};

impl From<RegistryError> for SessionError {
    #[track_caller]
    fn from(err: RegistryError) -> Self {
        let kind = match err {
            RegistryError::NotFound(_) => SessionErrorKind::NotFound,
            RegistryError::AlreadyExists(_) => SessionErrorKind::InvalidState,
        };
        SessionError::new(kind, err.to_string())
    }
}

/// Creates, joins and advances sessions.
///
/// Every accepted mutation is written to the registry first and then
/// published to the hub. No lock is held across the two steps.
#[derive(Debug, Clone, new)]
pub struct SessionService {
    registry: Arc<SessionRegistry>,
    directory: Arc<dyn ParticipantDirectory>,
    policy: Arc<dyn MovePolicy>,
    hub: HubHandle,
}

impl SessionService {
    /// Returns the underlying registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn ensure_participant(&self, id: &str) -> Result<(), SessionError> {
        self.directory.resolve(id).map(|_| ()).map_err(|e| {
            warn!(player_id = id, "Unknown participant");
            SessionError::new(SessionErrorKind::UnknownParticipant, e.to_string())
        })
    }

    fn commit(&self, mut session: Session) -> Result<Session, SessionError> {
        session.touch();
        self.registry.update(session.clone())?;
        self.hub.publish(Snapshot::from(&session));
        Ok(session)
    }

    /// Opens a new session with `creator_id` on the first mark.
    ///
    /// # Errors
    ///
    /// `UnknownParticipant` if the creator does not resolve, `InvalidMode`
    /// if `mode` is neither `PVP` nor `PVC`.
    #[instrument(skip(self))]
    pub fn create_session(&self, creator_id: &str, mode: &str) -> Result<Session, SessionError> {
        self.ensure_participant(creator_id)?;

        let mode: Mode = mode.parse().map_err(|_| {
            warn!(mode, "Invalid mode");
            SessionError::new(
                SessionErrorKind::InvalidMode,
                format!("Mode '{}' is not supported", mode),
            )
        })?;

        let session = Session::open(
            uuid::Uuid::new_v4().to_string(),
            creator_id.to_string(),
            mode,
        );
        self.registry.create(session.clone())?;
        self.hub.publish(Snapshot::from(&session));

        info!(session_id = %session.id(), ?mode, "Session created");
        Ok(session)
    }

    /// Seats `joiner_id` on the second mark of a waiting two-human session.
    ///
    /// # Errors
    ///
    /// `NotFound`, `UnknownParticipant`, or `InvalidState` when the session
    /// is not a two-human session awaiting its second participant, or when
    /// the joiner already holds the first seat.
    #[instrument(skip(self))]
    pub fn join_session(&self, id: &str, joiner_id: &str) -> Result<Session, SessionError> {
        let mut session = self.registry.get(id)?;
        self.ensure_participant(joiner_id)?;

        if *session.mode() != Mode::TwoHuman
            || *session.status() != Status::AwaitingSecondParticipant
        {
            warn!(mode = ?session.mode(), status = ?session.status(), "Session cannot be joined");
            return Err(SessionError::new(
                SessionErrorKind::InvalidState,
                format!("Session is {} and cannot be joined", session.status()),
            ));
        }

        if session.player_x() == joiner_id {
            warn!(player_id = joiner_id, "Creator tried to join own session");
            return Err(SessionError::new(
                SessionErrorKind::InvalidState,
                "Creator already holds the first seat",
            ));
        }

        session.seat_second(joiner_id.to_string());
        let session = self.commit(session)?;

        info!(session_id = %session.id(), player_id = joiner_id, "Participant joined");
        Ok(session)
    }

    /// Plays `(row, col)` for `actor_id`, then lets the automated seat reply.
    ///
    /// The returned session already includes the automated reply when one
    /// was due.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidState`, `NotParticipant`, `NotYourTurn` or
    /// `InvalidMove`, checked in that order.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        id: &str,
        actor_id: &str,
        row: i32,
        col: i32,
    ) -> Result<Session, SessionError> {
        let mut session = self.registry.get(id)?;

        if !session.is_in_progress() {
            warn!(status = ?session.status(), "Move on inactive session");
            return Err(SessionError::new(
                SessionErrorKind::InvalidState,
                format!("Session is {}", session.status()),
            ));
        }

        // The automated seat is never driven from outside.
        let mark = session
            .mark_of(actor_id)
            .filter(|_| actor_id != AUTOMATED_PARTICIPANT)
            .ok_or_else(|| {
                warn!(player_id = actor_id, "Move by non-participant");
                SessionError::new(
                    SessionErrorKind::NotParticipant,
                    format!("{} is not seated in this session", actor_id),
                )
            })?;

        if *session.turn() != Some(mark) {
            warn!(%mark, turn = ?session.turn(), "Move out of turn");
            return Err(SessionError::new(
                SessionErrorKind::NotYourTurn,
                format!("It is not {}'s turn", mark),
            ));
        }

        let verdict = session.play(mark, row, col).map_err(|e| {
            warn!(error = %e, "Invalid move");
            SessionError::new(SessionErrorKind::InvalidMove, e.to_string())
        })?;
        debug!(%mark, row, col, ?verdict, "Move applied");

        if let Some(automated) = session.automated_mark()
            && session.is_in_progress()
            && *session.turn() == Some(automated)
        {
            self.automated_reply(&mut session, automated);
        }

        let session = self.commit(session)?;
        info!(
            session_id = %session.id(),
            status = ?session.status(),
            outcome = ?session.outcome(),
            "Move completed"
        );
        debug!(board = %session.board().display(), "Board after move");
        Ok(session)
    }

    /// Asks the policy for a cell and folds it into `session`.
    ///
    /// An illegal reply is dropped and the session stays on the automated
    /// seat's turn.
    fn automated_reply(&self, session: &mut Session, automated: Mark) {
        let cell = self
            .policy
            .choose_move(session.board(), automated, automated.opponent());

        match session.play(automated, cell.row, cell.col) {
            Ok(Verdict::Ongoing) => debug!(%cell, "Automated reply applied"),
            Ok(verdict) => debug!(%cell, ?verdict, "Automated reply ended the session"),
            Err(e) => warn!(%cell, error = %e, "Dropping illegal automated reply"),
        }
    }

    /// Returns the session with the given id.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub fn get_session(&self, id: &str) -> Result<Session, SessionError> {
        Ok(self.registry.get(id)?)
    }

    /// Lists sessions matching `filter`, enriched with creator names.
    ///
    /// A creator that no longer resolves leaves the creator fields blank.
    #[instrument(skip(self))]
    pub fn list_sessions(&self, filter: &SessionFilter) -> Vec<SessionSummary> {
        self.registry
            .list(filter)
            .iter()
            .map(|session| {
                let created_by = self
                    .directory
                    .resolve(session.player_x())
                    .map(|creator| CreatorInfo {
                        player_id: creator.id().clone(),
                        name: creator.name().clone(),
                    })
                    .unwrap_or_default();

                SessionSummary {
                    game_id: session.id().clone(),
                    mode: *session.mode(),
                    status: *session.status(),
                    created_at: *session.created_at(),
                    created_by,
                }
            })
            .collect()
    }
}
