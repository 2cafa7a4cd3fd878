//! Mapping of session errors onto HTTP responses.

use crate::error::{SessionError, SessionErrorKind};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::Display;
use serde_json::json;
use tracing::debug;

/// Error returned by HTTP handlers.
#[derive(Debug, Display)]
pub enum ApiError {
    /// A rejected session operation.
    #[display("{}", _0)]
    Session(SessionError),

    /// Malformed request.
    #[display("Bad request: {}", _0)]
    BadRequest(String),
}

impl std::error::Error for ApiError {}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(e) => match e.kind() {
                SessionErrorKind::NotFound | SessionErrorKind::UnknownParticipant => {
                    StatusCode::NOT_FOUND
                }
                SessionErrorKind::NotParticipant => StatusCode::FORBIDDEN,
                SessionErrorKind::InvalidMode
                | SessionErrorKind::InvalidState
                | SessionErrorKind::NotYourTurn
                | SessionErrorKind::InvalidMove => StatusCode::BAD_REQUEST,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Session(e) => json!({ "error": e.kind().to_string(), "message": e.message }),
            ApiError::BadRequest(message) => json!({ "error": "BadRequest", "message": message }),
        };
        debug!(%status, error = %self, "Request rejected");
        (status, Json(body)).into_response()
    }
}
