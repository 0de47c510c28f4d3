//! Shared plumbing for the JSON API: the error type every handler returns
//! and the helper that runs store calls on the blocking pool.

use crate::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ironlog_workouts::StoreError;
use rusqlite::Connection;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            tracing::warn!(error = %e, "database busy");
            return ApiError::ServiceUnavailable("database is busy, retry later".to_string());
        }
        match e {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} {id} not found"))
            }
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Database(err) => {
                tracing::error!(error = %err, "store operation failed");
                ApiError::InternalServerError("database error".to_string())
            }
        }
    }
}

/// Checks out a pooled connection on the blocking pool and runs `f` with it.
///
/// The connection goes back to the pool when `f` returns, on every path.
/// Failing to obtain one within the pool's timeout is reported as 503.
pub(crate) async fn with_conn<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::warn!(error = %e, "database connection checkout failed");
            ApiError::ServiceUnavailable(format!("db connection failed: {e}"))
        })?;
        f(&*conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                StoreError::NotFound {
                    entity: "workout",
                    id: 3,
                },
                StatusCode::NOT_FOUND,
            ),
            (StoreError::Conflict("in use".into()), StatusCode::CONFLICT),
            (
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                    None,
                )),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StoreError::Database(rusqlite::Error::QueryReturnedNoRows),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = ApiError::from(StoreError::NotFound {
            entity: "exercise",
            id: 9,
        });
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "exercise 9 not found"));
    }
}
