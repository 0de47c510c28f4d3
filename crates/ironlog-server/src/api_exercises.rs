//! Handlers for `/api/v1/exercises`.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use ironlog_workouts::{
    create_exercise, delete_exercise, get_exercise, list_exercises, patch_exercise, Exercise,
    ExercisePatch, NewExercise, Page,
};
use std::sync::Arc;

/// Handler for `GET /api/v1/exercises`.
pub async fn list_exercises_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Exercise>>, ApiError> {
    let exercises = with_conn(state, move |conn| list_exercises(conn, page)).await?;
    Ok(Json(exercises))
}

/// Handler for `POST /api/v1/exercises`.
pub async fn create_exercise_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewExercise>,
) -> Result<(StatusCode, Json<Exercise>), ApiError> {
    let exercise = with_conn(state, move |conn| create_exercise(conn, &payload)).await?;
    tracing::info!(exercise_id = exercise.id, name = %exercise.name, "exercise created");
    Ok((StatusCode::CREATED, Json(exercise)))
}

/// Handler for `GET /api/v1/exercises/{exerciseId}`.
pub async fn get_exercise_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(exercise_id): Path<i64>,
) -> Result<Json<Exercise>, ApiError> {
    let exercise = with_conn(state, move |conn| get_exercise(conn, exercise_id)).await?;
    Ok(Json(exercise))
}

/// Handler for `PATCH /api/v1/exercises/{exerciseId}`.
pub async fn patch_exercise_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(exercise_id): Path<i64>,
    Json(patch): Json<ExercisePatch>,
) -> Result<Json<Exercise>, ApiError> {
    let exercise = with_conn(state, move |conn| patch_exercise(conn, exercise_id, &patch)).await?;
    Ok(Json(exercise))
}

/// Handler for `DELETE /api/v1/exercises/{exerciseId}`.
///
/// Returns 409 while any logged set still uses the exercise.
pub async fn delete_exercise_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(exercise_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    with_conn(state, move |conn| delete_exercise(conn, exercise_id)).await?;
    tracing::info!(exercise_id, "exercise deleted");
    Ok(StatusCode::NO_CONTENT)
}
