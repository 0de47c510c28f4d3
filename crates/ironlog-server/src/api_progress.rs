//! Read-only progress views: the trophy room, per-exercise history and
//! statistics, and training streaks.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use chrono::Utc;
use ironlog_workouts::{
    exercise_stats, previous_session, trophy_room, workout_streak, ExerciseStats, PrPeriod,
    PreviousSession, StoreError, Streak, TrophyRoom,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct TrophyRoomParams {
    /// `month` (default) or `year`.
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviousSessionParams {
    pub exclude_workout_id: Option<i64>,
}

/// Handler for `GET /api/v1/pr/trophy-room`.
pub async fn trophy_room_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TrophyRoomParams>,
) -> Result<Json<TrophyRoom>, ApiError> {
    let period = match params.period.as_deref() {
        Some(raw) => raw.parse::<PrPeriod>().map_err(StoreError::from)?,
        None => PrPeriod::default(),
    };
    let room = with_conn(state, move |conn| trophy_room(conn, period, Utc::now())).await?;
    Ok(Json(room))
}

/// Handler for `GET /api/v1/exercises/{exerciseId}/previous-session`.
pub async fn previous_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(exercise_id): Path<i64>,
    Query(params): Query<PreviousSessionParams>,
) -> Result<Json<PreviousSession>, ApiError> {
    let session = with_conn(state, move |conn| {
        previous_session(conn, exercise_id, params.exclude_workout_id)
    })
    .await?;
    Ok(Json(session))
}

/// Handler for `GET /api/v1/exercises/{exerciseId}/stats`.
pub async fn exercise_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(exercise_id): Path<i64>,
) -> Result<Json<ExerciseStats>, ApiError> {
    let stats = with_conn(state, move |conn| exercise_stats(conn, exercise_id)).await?;
    Ok(Json(stats))
}

/// Handler for `GET /api/v1/streak`. Days are UTC calendar days.
pub async fn streak_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Streak>, ApiError> {
    let today = Utc::now().date_naive();
    let streak = with_conn(state, move |conn| workout_streak(conn, today)).await?;
    Ok(Json(streak))
}
