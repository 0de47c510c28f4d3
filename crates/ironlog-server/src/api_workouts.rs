//! Handlers for `/api/v1/workouts` and the sets nested under it.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
};
use ironlog_workouts::{
    add_set, calories, create_workout, delete_set, delete_workout, get_workout_detail,
    list_sets, list_workouts, patch_set, patch_workout, NewSet, NewWorkout, SetPatch, Workout,
    WorkoutDetail, WorkoutFilter, WorkoutPatch, WorkoutSet,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    /// Body weight used for the calorie estimate.
    pub weight_kg: Option<f64>,
}

/// A workout with its sets and, when a body weight was supplied, the
/// estimated calories burned.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkoutDetailResponse {
    #[serde(flatten)]
    pub detail: WorkoutDetail,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimated_calories: Option<f64>,
}

/// Handler for `GET /api/v1/workouts`.
pub async fn list_workouts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(filter): Query<WorkoutFilter>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    let workouts = with_conn(state, move |conn| list_workouts(conn, filter)).await?;
    Ok(Json(workouts))
}

/// Handler for `POST /api/v1/workouts`.
pub async fn create_workout_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewWorkout>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let workout = with_conn(state, move |conn| create_workout(conn, &payload)).await?;
    tracing::info!(
        workout_id = workout.id,
        intensity = workout.intensity.map(|i| i.as_str()),
        "workout created"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

/// Handler for `GET /api/v1/workouts/{workoutId}`.
pub async fn get_workout_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(workout_id): Path<i64>,
    Query(params): Query<DetailParams>,
) -> Result<Json<WorkoutDetailResponse>, ApiError> {
    let detail = with_conn(state, move |conn| get_workout_detail(conn, workout_id)).await?;
    let estimated_calories = calories::estimate_for_workout(&detail, params.weight_kg);
    Ok(Json(WorkoutDetailResponse {
        detail,
        estimated_calories,
    }))
}

/// Handler for `PATCH /api/v1/workouts/{workoutId}`.
pub async fn patch_workout_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(workout_id): Path<i64>,
    Json(patch): Json<WorkoutPatch>,
) -> Result<Json<Workout>, ApiError> {
    let workout = with_conn(state, move |conn| patch_workout(conn, workout_id, &patch)).await?;
    Ok(Json(workout))
}

/// Handler for `DELETE /api/v1/workouts/{workoutId}`. Removes its sets too.
pub async fn delete_workout_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(workout_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    with_conn(state, move |conn| delete_workout(conn, workout_id)).await?;
    tracing::info!(workout_id, "workout deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `GET /api/v1/workouts/{workoutId}/sets`.
pub async fn list_sets_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(workout_id): Path<i64>,
) -> Result<Json<Vec<WorkoutSet>>, ApiError> {
    let sets = with_conn(state, move |conn| list_sets(conn, workout_id)).await?;
    Ok(Json(sets))
}

/// Handler for `POST /api/v1/workouts/{workoutId}/sets`.
pub async fn add_set_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(workout_id): Path<i64>,
    Json(payload): Json<NewSet>,
) -> Result<(StatusCode, Json<WorkoutSet>), ApiError> {
    let set = with_conn(state, move |conn| add_set(conn, workout_id, &payload)).await?;
    Ok((StatusCode::CREATED, Json(set)))
}

/// Handler for `PATCH /api/v1/workouts/{workoutId}/sets/{setId}`.
pub async fn patch_set_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((workout_id, set_id)): Path<(i64, i64)>,
    Json(patch): Json<SetPatch>,
) -> Result<Json<WorkoutSet>, ApiError> {
    let set = with_conn(state, move |conn| patch_set(conn, workout_id, set_id, &patch)).await?;
    Ok(Json(set))
}

/// Handler for `DELETE /api/v1/workouts/{workoutId}/sets/{setId}`.
pub async fn delete_set_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((workout_id, set_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    with_conn(state, move |conn| delete_set(conn, workout_id, set_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
