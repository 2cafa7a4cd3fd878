//! Participant directory: identity lookup for creators and joiners.

use crate::session::ParticipantId;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, instrument};

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Participant {
    /// Unique id.
    id: ParticipantId,
    /// Display name.
    name: String,
}

/// Error returned when a participant id does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Participant {} not found", _0)]
pub struct DirectoryError(pub ParticipantId);

impl std::error::Error for DirectoryError {}

/// Resolves participant ids.
pub trait ParticipantDirectory: Send + Sync + std::fmt::Debug {
    /// Looks up a participant by id.
    fn resolve(&self, id: &str) -> Result<Participant, DirectoryError>;
}

/// Process-lifetime participant store.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    participants: RwLock<HashMap<ParticipantId, Participant>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new participant under a fresh id.
    #[instrument(skip(self))]
    pub fn register(&self, name: &str) -> Participant {
        let participant = Participant::new(uuid::Uuid::new_v4().to_string(), name.to_string());
        self.participants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant.id.clone(), participant.clone());
        info!(player_id = %participant.id, "Participant registered");
        participant
    }
}

impl ParticipantDirectory for InMemoryDirectory {
    #[instrument(skip(self))]
    fn resolve(&self, id: &str) -> Result<Participant, DirectoryError> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| {
                debug!("Participant not found");
                DirectoryError(id.to_string())
            })
    }
}
