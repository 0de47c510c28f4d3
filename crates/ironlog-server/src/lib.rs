//! Ironlog HTTP server library logic.

pub mod api;
pub mod api_exercises;
pub mod api_health;
pub mod api_progress;
pub mod api_workouts;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
    Extension, Router,
};
use ironlog_db::DbPool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Origins allowed by CORS; empty means any origin.
    pub cors_origins: Vec<String>,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            cors_origins: Vec::new(),
        }
    }
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(api_health::health_handler))
        .route("/health/ready", get(api_health::readiness_handler))
        .route(
            "/exercises",
            get(api_exercises::list_exercises_handler)
                .post(api_exercises::create_exercise_handler),
        )
        .route(
            "/exercises/{exerciseId}",
            get(api_exercises::get_exercise_handler)
                .patch(api_exercises::patch_exercise_handler)
                .delete(api_exercises::delete_exercise_handler),
        )
        .route(
            "/exercises/{exerciseId}/previous-session",
            get(api_progress::previous_session_handler),
        )
        .route(
            "/exercises/{exerciseId}/stats",
            get(api_progress::exercise_stats_handler),
        )
        .route("/pr/trophy-room", get(api_progress::trophy_room_handler))
        .route("/streak", get(api_progress::streak_handler))
        .route(
            "/workouts",
            get(api_workouts::list_workouts_handler).post(api_workouts::create_workout_handler),
        )
        .route(
            "/workouts/{workoutId}",
            get(api_workouts::get_workout_handler)
                .patch(api_workouts::patch_workout_handler)
                .delete(api_workouts::delete_workout_handler),
        )
        .route(
            "/workouts/{workoutId}/sets",
            get(api_workouts::list_sets_handler).post(api_workouts::add_set_handler),
        )
        .route(
            "/workouts/{workoutId}/sets/{setId}",
            axum::routing::patch(api_workouts::patch_set_handler)
                .delete(api_workouts::delete_set_handler),
        );

    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(api_health::health_handler))
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
