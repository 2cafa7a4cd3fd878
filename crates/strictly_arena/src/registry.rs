//! Concurrent in-memory session registry.

use crate::session::{Mode, Session, SessionId, Status};
use derive_new::new;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

/// Errors surfaced by the registry.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RegistryError {
    /// No session with this id.
    #[display("Session {} not found", _0)]
    NotFound(SessionId),

    /// A session with this id already exists.
    #[display("Session {} already exists", _0)]
    AlreadyExists(SessionId),
}

impl std::error::Error for RegistryError {}

/// Filter applied by [`SessionRegistry::list`].
///
/// `offset` below zero is treated as zero; `limit` of zero or less means
/// no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct SessionFilter {
    /// Exact match on mode.
    pub mode: Option<Mode>,
    /// Exact match on status.
    pub status: Option<Status>,
    /// Number of matches to skip.
    pub offset: i64,
    /// Maximum number of matches to return.
    pub limit: i64,
}

impl SessionFilter {
    fn matches(&self, session: &Session) -> bool {
        self.mode.is_none_or(|mode| *session.mode() == mode)
            && self.status.is_none_or(|status| *session.status() == status)
    }
}

/// Stores session records keyed by id.
///
/// Readers share the lock; writers are exclusive, so no caller ever sees a
/// torn record and concurrent updates to one id serialize (last writer wins).
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    // Records are replaced whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyExists`] if the id is taken.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub fn create(&self, session: Session) -> Result<(), RegistryError> {
        let mut sessions = self.write();
        if sessions.contains_key(session.id()) {
            warn!("Session already exists");
            return Err(RegistryError::AlreadyExists(session.id().clone()));
        }
        sessions.insert(session.id().clone(), session);
        debug!(count = sessions.len(), "Session created");
        Ok(())
    }

    /// Returns a copy of the session with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<Session, RegistryError> {
        self.read().get(id).cloned().ok_or_else(|| {
            debug!("Session not found");
            RegistryError::NotFound(id.to_string())
        })
    }

    /// Replaces an existing session record. This is not an upsert.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the id is absent.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub fn update(&self, session: Session) -> Result<(), RegistryError> {
        let mut sessions = self.write();
        match sessions.get_mut(session.id()) {
            Some(slot) => {
                *slot = session;
                debug!("Session updated");
                Ok(())
            }
            None => {
                warn!("Update against missing session");
                Err(RegistryError::NotFound(session.id().clone()))
            }
        }
    }

    /// Lists sessions matching `filter`, oldest first.
    ///
    /// Filtering and pagination run over one snapshot taken under a single
    /// read lock.
    #[instrument(skip(self))]
    pub fn list(&self, filter: &SessionFilter) -> Vec<Session> {
        let mut matching: Vec<Session> = self
            .read()
            .values()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            a.created_at()
                .cmp(b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let offset = usize::try_from(filter.offset.max(0)).unwrap_or(usize::MAX);
        let limit = match usize::try_from(filter.limit) {
            Ok(limit) if limit > 0 => limit,
            _ => usize::MAX,
        };

        let page: Vec<Session> = matching.into_iter().skip(offset).take(limit).collect();
        debug!(count = page.len(), "Listed sessions");
        page
    }

    /// Returns the number of stored sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no session is stored.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
