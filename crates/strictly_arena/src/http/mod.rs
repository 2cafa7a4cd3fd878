//! HTTP and WebSocket transport over the session service.

mod error;
mod handlers;
mod observe;

pub use error::ApiError;
pub use handlers::{
    ApiJson, ApiQuery, CreatePlayerRequest, CreatePlayerResponse, CreateSessionRequest,
    ListSessionsQuery, ListSessionsResponse, MoveRequest, PLAYER_ID_HEADER, PlayerId,
};

use crate::config::ServerConfig;
use crate::directory::InMemoryDirectory;
use crate::hub::{HubHandle, NotificationHub};
use crate::registry::SessionRegistry;
use crate::service::SessionService;
use axum::Router;
use axum::extract::Request;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, instrument};

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session orchestrator.
    pub service: SessionService,
    /// Participant store backing `/players`.
    pub directory: Arc<InMemoryDirectory>,
    /// Observer fan-out.
    pub hub: HubHandle,
    /// Per-observer delivery buffer.
    pub subscriber_buffer: usize,
    /// Deadline for a single request.
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires registry, directory, policy and hub from `config`.
    ///
    /// Must be called inside a tokio runtime; the hub task is spawned here.
    #[instrument(skip(config))]
    pub fn from_config(config: &ServerConfig) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let hub = NotificationHub::spawn();
        let service = SessionService::new(
            Arc::new(SessionRegistry::new()),
            directory.clone(),
            config.policy().build(),
            hub.clone(),
        );

        info!(policy = ?config.policy(), "Application state ready");
        Self {
            service,
            directory,
            hub,
            subscriber_buffer: *config.subscriber_buffer(),
            request_timeout: Duration::from_secs(*config.request_timeout_secs()),
        }
    }
}

/// Builds the application router.
///
/// Every request gets an `x-request-id` (generated when absent, echoed on
/// the response and recorded on the trace span) and a deadline of
/// `state.request_timeout`.
pub fn router(state: AppState) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/players", post(handlers::create_player))
        .route(
            "/games",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/games/{game_id}", get(handlers::get_session))
        .route("/games/{game_id}/join", post(handlers::join_session))
        .route("/games/{game_id}/moves", post(handlers::make_move))
        .route("/ws/games/{game_id}", get(observe::observe_session))
        .layer(TimeoutLayer::new(timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
