//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that converts
//! into a JSON response via its [`IntoResponse`] implementation.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use snooze_core::{AlarmDate, AlarmTime, ValidationError};
use snooze_db::DbError;
use tracing::warn;

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed client input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failure, including duplicate alarms.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Another request panicked while holding the database.
    #[error("database lock poisoned")]
    LockPoisoned,

    /// The alarm falls into a daylight-saving gap.
    #[error("{time} on {date} does not exist in the local time zone")]
    NonexistentLocalTime { date: AlarmDate, time: AlarmTime },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Self::Db(DbError::DuplicateAlarm { .. }) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "success": false }),
            ),
            Self::NonexistentLocalTime { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": message }))
            }
            Self::Db(_) | Self::LockPoisoned => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };
        if status.is_server_error() {
            warn!(error = %message, "request failed");
        }
        (status, Json(body)).into_response()
    }
}
