use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ironlog_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use ironlog_server::{app, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn setup_app_with(settings: DbRuntimeSettings) -> (Router, DbPool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("api.db");
    let pool = create_pool(path.to_str().unwrap(), settings).unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();
    (app(AppState::new(pool.clone())), pool, dir)
}

fn setup_app() -> (Router, DbPool, TempDir) {
    setup_app_with(DbRuntimeSettings::default())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn count(pool: &DbPool, table: &str) -> i64 {
    pool.get()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[tokio::test]
async fn test_log_session_with_intensity() {
    let (app, pool, _dir) = setup_app();

    let (status, exercise) = send(
        &app,
        "POST",
        "/api/v1/exercises",
        Some(json!({ "name": "Bench Press" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exercise["id"], 1);

    let (status, workout) = send(
        &app,
        "POST",
        "/api/v1/workouts",
        Some(json!({
            "started_at": "2025-02-12T08:00:00Z",
            "duration_seconds": 3600,
            "intensity": "moderate"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(workout["id"], 1);
    assert_eq!(workout["intensity"], "moderate");

    let (status, set) = send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({ "exercise_id": 1, "reps": 8, "weight": 60.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(set["id"], 1);
    assert_eq!(set["is_pr"], true);
    assert_eq!(set["pr_type"], "weight");

    let (status, detail) = send(&app, "GET", "/api/v1/workouts/1?weight_kg=80", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["intensity"], "moderate");
    assert_eq!(detail["sets"].as_array().unwrap().len(), 1);
    assert_eq!(detail["estimated_calories"], 420.0);

    let (status, detail) = send(&app, "GET", "/api/v1/workouts/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail.get("estimated_calories").is_none());

    let (status, _) = send(&app, "DELETE", "/api/v1/workouts/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(count(&pool, "workout_sets"), 0);

    let (status, _) = send(&app, "GET", "/api/v1/workouts/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_intensity_is_bad_request() {
    let (app, pool, _dir) = setup_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/workouts",
        Some(json!({ "intensity": "extreme" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("intensity"));
    assert_eq!(count(&pool, "workouts"), 0);
}

#[tokio::test]
async fn test_null_intensity_has_no_estimate() {
    let (app, _pool, _dir) = setup_app();

    let (status, workout) = send(
        &app,
        "POST",
        "/api/v1/workouts",
        Some(json!({ "duration_seconds": 1800, "intensity": null })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(workout["intensity"], Value::Null);

    let (status, detail) = send(&app, "GET", "/api/v1/workouts/1?weight_kg=80", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["intensity"], Value::Null);
    assert!(detail.get("estimated_calories").is_none());
}

#[tokio::test]
async fn test_set_for_missing_workout_is_not_found() {
    let (app, pool, _dir) = setup_app();
    send(&app, "POST", "/api/v1/exercises", Some(json!({ "name": "Row" }))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/workouts/999/sets",
        Some(json!({ "exercise_id": 1, "reps": 5, "weight": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "workout 999 not found");
    assert_eq!(count(&pool, "workout_sets"), 0);
}

#[tokio::test]
async fn test_set_validation_and_nested_routes() {
    let (app, _pool, _dir) = setup_app();
    send(&app, "POST", "/api/v1/exercises", Some(json!({ "name": "Row" }))).await;
    send(&app, "POST", "/api/v1/workouts", Some(json!({}))).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({ "exercise_id": 1, "reps": 0, "weight": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({ "exercise_id": 1, "reps": 5, "weight": 50.0, "set_label": "working" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, patched) = send(
        &app,
        "PATCH",
        "/api/v1/workouts/1/sets/1",
        Some(json!({ "reps": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["reps"], 6);
    assert_eq!(patched["set_label"], "working");

    let (status, sets) = send(&app, "GET", "/api/v1/workouts/1/sets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sets.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/api/v1/workouts/1/sets/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", "/api/v1/workouts/1/sets/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_workout_partial_update() {
    let (app, _pool, _dir) = setup_app();
    send(
        &app,
        "POST",
        "/api/v1/workouts",
        Some(json!({
            "started_at": "2025-02-12T08:00:00Z",
            "notes": "push day",
            "intensity": "light"
        })),
    )
    .await;

    let (status, patched) = send(
        &app,
        "PATCH",
        "/api/v1/workouts/1",
        Some(json!({ "ended_at": "2025-02-12T09:00:00Z", "intensity": "vigorous" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["notes"], "push day");
    assert_eq!(patched["intensity"], "vigorous");
    assert_eq!(patched["duration_seconds"], 3600);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/v1/workouts/1",
        Some(json!({ "intensity": "maximal" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_null_for_required_fields_is_bad_request() {
    let (app, _pool, _dir) = setup_app();
    send(&app, "POST", "/api/v1/exercises", Some(json!({ "name": "Row" }))).await;
    send(
        &app,
        "POST",
        "/api/v1/workouts",
        Some(json!({ "started_at": "2025-02-12T08:00:00Z" })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({ "exercise_id": 1, "reps": 5, "weight": 50.0 })),
    )
    .await;

    let (status, error) = send(
        &app,
        "PATCH",
        "/api/v1/workouts/1/sets/1",
        Some(json!({ "reps": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "reps cannot be null");

    let (status, error) = send(
        &app,
        "PATCH",
        "/api/v1/workouts/1",
        Some(json!({ "started_at": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "started_at cannot be null");

    let (_, workout) = send(&app, "GET", "/api/v1/workouts/1", None).await;
    assert_eq!(workout["started_at"], "2025-02-12T08:00:00Z");
    assert_eq!(workout["sets"][0]["reps"], 5);
}

#[tokio::test]
async fn test_set_tempo_and_rest_fields() {
    let (app, _pool, _dir) = setup_app();
    send(&app, "POST", "/api/v1/exercises", Some(json!({ "name": "Row" }))).await;
    send(&app, "POST", "/api/v1/workouts", Some(json!({}))).await;

    let (status, set) = send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({
            "exercise_id": 1,
            "reps": 8,
            "weight": 40.0,
            "time_under_tension_seconds": 32,
            "rest_seconds_after": 90
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(set["time_under_tension_seconds"], 32);
    assert_eq!(set["rest_seconds_after"], 90);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/workouts/1/sets",
        Some(json!({ "exercise_id": 1, "reps": 8, "weight": 40.0, "rest_seconds_after": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_workouts_most_recent_first() {
    let (app, _pool, _dir) = setup_app();
    for day in ["10", "14", "12"] {
        send(
            &app,
            "POST",
            "/api/v1/workouts",
            Some(json!({ "started_at": format!("2025-02-{day}T08:00:00Z") })),
        )
        .await;
    }

    let (status, listed) = send(&app, "GET", "/api/v1/workouts", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [2, 3, 1]);

    let (status, ranged) = send(
        &app,
        "GET",
        "/api/v1/workouts?from=2025-02-11T00:00:00Z&to=2025-02-13T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ranged.as_array().unwrap().len(), 1);
    assert_eq!(ranged[0]["id"], 3);
}

#[tokio::test]
async fn test_locked_database_is_service_unavailable() {
    let (app, _pool, dir) = setup_app_with(DbRuntimeSettings {
        busy_timeout_ms: 50,
        ..DbRuntimeSettings::default()
    });

    let blocker = rusqlite::Connection::open(dir.path().join("api.db")).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/exercises",
        Some(json!({ "name": "Bench Press" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());

    blocker.execute_batch("ROLLBACK;").unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/exercises",
        Some(json!({ "name": "Bench Press" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
