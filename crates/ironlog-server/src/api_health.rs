//! Liveness and readiness checks.

use crate::AppState;
use axum::{extract::Extension, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Liveness: the process is up and serving requests.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: a pooled connection can be checked out and answers `SELECT 1`.
pub async fn readiness_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> (StatusCode, Json<Value>) {
    let ping_result = tokio::task::spawn_blocking(move || -> Result<(), String> {
        let conn = state.pool.get().map_err(|e| e.to_string())?;
        ironlog_db::ping(&conn).map_err(|e| e.to_string())
    })
    .await
    .unwrap_or_else(|e| Err(format!("task join error: {e}")));

    match ping_result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "connected" })),
        ),
        Err(reason) => {
            tracing::warn!(%reason, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "database": reason })),
            )
        }
    }
}
