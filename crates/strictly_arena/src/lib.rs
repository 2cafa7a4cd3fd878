//! Strictly Arena - multiplayer tic-tac-toe sessions with live observers.
//!
//! # Architecture
//!
//! - **Registry**: concurrent store of session records
//! - **Service**: the session state machine (create, join, move, list)
//! - **Hub**: actor-style fan-out of snapshots to observers
//! - **HTTP**: REST endpoints plus a WebSocket observer stream
//!
//! # Example
//!
//! ```no_run
//! use strictly_arena::{AppState, ServerConfig, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let app = router(AppState::from_config(&config));
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod directory;
mod error;
mod http;
mod hub;
mod registry;
mod service;
mod session;
mod snapshot;

// Crate-level exports - Configuration
pub use config::{ConfigError, HOST_ENV, PORT_ENV, PolicyKind, ServerConfig};

// Crate-level exports - Participants
pub use directory::{DirectoryError, InMemoryDirectory, Participant, ParticipantDirectory};

// Crate-level exports - Errors
pub use error::{SessionError, SessionErrorKind};

// Crate-level exports - Transport
pub use http::{
    ApiError, ApiJson, ApiQuery, AppState, CreatePlayerRequest, CreatePlayerResponse,
    CreateSessionRequest, ListSessionsQuery, ListSessionsResponse, MoveRequest, PLAYER_ID_HEADER,
    PlayerId, REQUEST_ID_HEADER, router,
};

// Crate-level exports - Notification hub
pub use hub::{HubHandle, HubMessage, NotificationHub, SubscriberHandle};

// Crate-level exports - Registry
pub use registry::{RegistryError, SessionFilter, SessionRegistry};

// Crate-level exports - Session orchestration
pub use service::SessionService;
pub use session::{
    AUTOMATED_PARTICIPANT, Mode, Outcome, ParticipantId, Session, SessionId, Status,
};
pub use snapshot::{CreatorInfo, SessionSummary, Snapshot};
