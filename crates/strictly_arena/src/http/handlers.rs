//! REST handlers.

use super::{ApiError, AppState};
use crate::directory::Participant;
use crate::registry::SessionFilter;
use crate::session::{Mode, Status};
use crate::snapshot::{SessionSummary, Snapshot};
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

/// Header carrying the acting participant's id.
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// The acting participant, taken from the `X-Player-Id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for PlayerId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PLAYER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| PlayerId(id.to_string()))
            .ok_or_else(|| ApiError::BadRequest("missing X-Player-Id header".to_string()))
    }
}

/// JSON body extractor whose failures use the API error shape.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor whose failures use the API error shape.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlayerRequest {
    /// Display name.
    pub name: String,
}

/// Response of `POST /players`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerResponse {
    /// New participant id.
    pub player_id: String,
    /// Display name.
    pub name: String,
}

impl From<Participant> for CreatePlayerResponse {
    fn from(participant: Participant) -> Self {
        Self {
            player_id: participant.id().clone(),
            name: participant.name().clone(),
        }
    }
}

/// Body of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// `PVP` or `PVC`.
    pub mode: String,
}

/// Body of `POST /games/{id}/moves`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Target row.
    pub row: i32,
    /// Target column.
    pub col: i32,
}

/// Query of `GET /games`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSessionsQuery {
    /// Exact match on mode.
    pub mode: Option<String>,
    /// Exact match on status.
    pub status: Option<String>,
    /// Page size; zero or less for no limit.
    pub limit: Option<String>,
    /// Matches to skip.
    pub offset: Option<String>,
}

/// Empty or unparsable paging values fall back to the default.
fn parse_page_value(value: Option<String>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

impl ListSessionsQuery {
    fn into_filter(self) -> Result<SessionFilter, ApiError> {
        let mode = self
            .mode
            .filter(|m| !m.is_empty())
            .map(|m| {
                m.parse::<Mode>()
                    .map_err(|_| ApiError::BadRequest(format!("unknown mode '{}'", m)))
            })
            .transpose()?;
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Status>()
                    .map_err(|_| ApiError::BadRequest(format!("unknown status '{}'", s)))
            })
            .transpose()?;

        Ok(SessionFilter::new(
            mode,
            status,
            parse_page_value(self.offset),
            parse_page_value(self.limit),
        ))
    }
}

/// Response of `GET /games`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    /// Matching sessions.
    pub games: Vec<SessionSummary>,
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub(super) async fn create_player(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePlayerRequest>,
) -> Result<(StatusCode, Json<CreatePlayerResponse>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let participant = state.directory.register(name);
    info!(player_id = %participant.id(), "Player created");
    Ok((StatusCode::CREATED, Json(participant.into())))
}

#[instrument(skip(state, req), fields(player_id = %player.0, mode = %req.mode))]
pub(super) async fn create_session(
    State(state): State<AppState>,
    player: PlayerId,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Snapshot>), ApiError> {
    let session = state.service.create_session(&player.0, &req.mode)?;
    Ok((StatusCode::CREATED, Json(Snapshot::from(&session))))
}

#[instrument(skip(state))]
pub(super) async fn list_sessions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListSessionsQuery>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let filter = query.into_filter()?;
    let games = state.service.list_sessions(&filter);
    debug!(count = games.len(), "Listing sessions");
    Ok(Json(ListSessionsResponse { games }))
}

#[instrument(skip(state))]
pub(super) async fn get_session(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    let session = state.service.get_session(&game_id)?;
    Ok(Json(Snapshot::from(&session)))
}

#[instrument(skip(state), fields(player_id = %player.0))]
pub(super) async fn join_session(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    player: PlayerId,
) -> Result<Json<Snapshot>, ApiError> {
    let session = state.service.join_session(&game_id, &player.0)?;
    Ok(Json(Snapshot::from(&session)))
}

#[instrument(skip(state), fields(player_id = %player.0))]
pub(super) async fn make_move(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    player: PlayerId,
    ApiJson(req): ApiJson<MoveRequest>,
) -> Result<Json<Snapshot>, ApiError> {
    let session = state
        .service
        .make_move(&game_id, &player.0, req.row, req.col)?;
    Ok(Json(Snapshot::from(&session)))
}
