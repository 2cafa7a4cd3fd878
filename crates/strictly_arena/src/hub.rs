//! Real-time fan-out of session snapshots to observers.
//!
//! The membership table lives inside a single tokio task. Every
//! [`HubHandle`] operation is a message on an unbounded channel, so callers
//! never block and never touch the table directly. Each subscriber owns a
//! bounded queue; a full queue drops that publication for that subscriber
//! only.

use crate::session::SessionId;
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

/// Message delivered to observers, serialized as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum HubMessage {
    /// Current session state.
    State(Snapshot),
    /// Out-of-band notice for one observer.
    Error {
        /// Notice text.
        message: String,
    },
}

impl HubMessage {
    fn encode(&self) -> Option<Arc<str>> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Arc::from(text)),
            Err(e) => {
                error!(error = %e, "Failed to serialize hub message");
                None
            }
        }
    }
}

/// An observer's delivery channel.
///
/// The connection layer owns the receiving half and decides the buffer
/// size; the hub only tracks membership.
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: Uuid,
    sender: mpsc::Sender<Arc<str>>,
}

impl SubscriberHandle {
    /// Creates a handle with a delivery buffer of `capacity` messages.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            sender,
        };
        (handle, receiver)
    }

    /// Returns the handle's unique id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attempts delivery without waiting. Returns false if dropped.
    fn offer(&self, payload: Arc<str>) -> bool {
        match self.sender.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(subscriber = %self.id, "Subscriber buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!(subscriber = %self.id, "Subscriber channel closed");
                false
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

enum Command {
    Subscribe {
        session_id: SessionId,
        handle: SubscriberHandle,
    },
    Unsubscribe {
        id: Uuid,
    },
    Publish {
        session_id: SessionId,
        payload: Arc<str>,
    },
    Count {
        session_id: SessionId,
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable front door to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Subscribe { session_id, handle } => f
                .debug_struct("Subscribe")
                .field("session_id", session_id)
                .field("subscriber", &handle.id)
                .finish(),
            Command::Unsubscribe { id } => f.debug_struct("Unsubscribe").field("id", id).finish(),
            Command::Publish { session_id, .. } => f
                .debug_struct("Publish")
                .field("session_id", session_id)
                .finish(),
            Command::Count { session_id, .. } => f
                .debug_struct("Count")
                .field("session_id", session_id)
                .finish(),
        }
    }
}

impl HubHandle {
    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            warn!(command = ?e.0, "Hub task has stopped, command dropped");
        }
    }

    /// Registers `handle` as an observer of `session_id`.
    ///
    /// Subscribing the same handle again moves it to the new session.
    #[instrument(skip(self, handle), fields(subscriber = %handle.id))]
    pub fn subscribe(&self, session_id: SessionId, handle: SubscriberHandle) {
        self.send(Command::Subscribe { session_id, handle });
    }

    /// Removes `handle` from whatever session it observes. Safe to repeat.
    #[instrument(skip(self, handle), fields(subscriber = %handle.id))]
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.send(Command::Unsubscribe { id: handle.id });
    }

    /// Serializes `snapshot` once and offers it to every current observer.
    #[instrument(skip(self, snapshot), fields(session_id = %snapshot.game_id))]
    pub fn publish(&self, snapshot: Snapshot) {
        let session_id = snapshot.game_id.clone();
        if let Some(payload) = HubMessage::State(snapshot).encode() {
            self.send(Command::Publish {
                session_id,
                payload,
            });
        }
    }

    /// Best-effort delivery of an error notice to a single observer.
    #[instrument(skip(self, handle), fields(subscriber = %handle.id))]
    pub fn notify_error(&self, handle: &SubscriberHandle, message: &str) {
        let notice = HubMessage::Error {
            message: message.to_string(),
        };
        if let Some(payload) = notice.encode() {
            handle.offer(payload);
        }
    }

    /// Returns the number of observers of `session_id`.
    ///
    /// Commands are processed in order, so the count reflects every
    /// subscribe and unsubscribe issued before this call.
    pub async fn subscriber_count(&self, session_id: &str) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(Command::Count {
            session_id: session_id.to_string(),
            reply,
        });
        response.await.unwrap_or(0)
    }
}

/// Membership table owned by the hub task.
#[derive(Debug, Default)]
pub struct NotificationHub {
    sessions: HashMap<SessionId, HashMap<Uuid, SubscriberHandle>>,
    index: HashMap<Uuid, SessionId>,
}

impl NotificationHub {
    /// Spawns the hub task and returns a handle to it.
    ///
    /// The task exits once every [`HubHandle`] has been dropped.
    #[instrument]
    pub fn spawn() -> HubHandle {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Self::default().run(receiver));
        info!("Notification hub started");
        HubHandle { commands }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Subscribe { session_id, handle } => self.subscribe(session_id, handle),
                Command::Unsubscribe { id } => self.unsubscribe(id),
                Command::Publish {
                    session_id,
                    payload,
                } => self.publish(&session_id, payload),
                Command::Count { session_id, reply } => {
                    let count = self.sessions.get(&session_id).map_or(0, HashMap::len);
                    let _ = reply.send(count);
                }
            }
        }
        info!("Notification hub stopped");
    }

    fn subscribe(&mut self, session_id: SessionId, handle: SubscriberHandle) {
        let id = handle.id;
        if self.index.get(&id) != Some(&session_id) {
            self.unsubscribe(id);
        }
        debug!(subscriber = %id, session_id = %session_id, "Subscriber registered");
        self.index.insert(id, session_id.clone());
        self.sessions.entry(session_id).or_default().insert(id, handle);
    }

    fn unsubscribe(&mut self, id: Uuid) {
        let Some(session_id) = self.index.remove(&id) else {
            return;
        };
        if let Some(members) = self.sessions.get_mut(&session_id) {
            members.remove(&id);
            if members.is_empty() {
                self.sessions.remove(&session_id);
            }
        }
        debug!(subscriber = %id, session_id = %session_id, "Subscriber removed");
    }

    fn publish(&mut self, session_id: &str, payload: Arc<str>) {
        let Some(members) = self.sessions.get(session_id) else {
            trace!(session_id, "No observers");
            return;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, handle) in members {
            if handle.offer(Arc::clone(&payload)) {
                delivered += 1;
            } else if handle.is_closed() {
                closed.push(*id);
            }
        }
        debug!(session_id, delivered, observers = members.len(), "Published snapshot");

        for id in closed {
            self.unsubscribe(id);
        }
    }
}
