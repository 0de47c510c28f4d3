//! Exercise definitions.

use crate::update::Assignments;
use crate::validate::{non_negative_int, not_null, optional_text, required_text};
use crate::{now_ts, row_exists, ts_column, write_tx, Page, StoreError};
use chrono::{DateTime, Utc};
use ironlog_types::limits::{
    DEFAULT_EXERCISE_PAGE, MAX_DESCRIPTION_LEN, MAX_EXERCISE_NAME_LEN, MAX_MUSCLE_GROUP_LEN,
    MAX_UNIT_LEN,
};
use ironlog_types::patch::nullable;
use ironlog_types::MeasurementMode;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const DEFAULT_UNIT: &str = "kg";

/// A named movement type usable across workouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-form muscle group or category label (e.g. "Chest").
    pub muscle_group: Option<String>,
    /// Unit the weight is recorded in (e.g. "kg", "lb").
    pub unit: String,
    pub measurement_mode: MeasurementMode,
    /// Preset for the rest timer, in seconds.
    pub rest_seconds_preset: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating an exercise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewExercise {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub muscle_group: Option<String>,
    /// Defaults to "kg".
    #[serde(default)]
    pub unit: Option<String>,
    /// Defaults to `weight_reps`.
    #[serde(default)]
    pub measurement_mode: Option<String>,
    #[serde(default)]
    pub rest_seconds_preset: Option<i64>,
}

/// Partial update for an exercise. Absent fields are left untouched; an
/// explicit `null` clears a nullable field and is rejected for `name`,
/// `unit` and `measurement_mode`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExercisePatch {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub muscle_group: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub measurement_mode: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rest_seconds_preset: Option<Option<i64>>,
}

const SELECT_EXERCISE: &str = "SELECT
        id, name, description, muscle_group, unit,
        measurement_mode, rest_seconds_preset, created_at
    FROM exercises";

/// Creates a new exercise and returns it as stored.
pub fn create_exercise(conn: &Connection, params: &NewExercise) -> Result<Exercise, StoreError> {
    let name = required_text("name", &params.name, MAX_EXERCISE_NAME_LEN)?;
    let description = optional_text(
        "description",
        params.description.clone(),
        MAX_DESCRIPTION_LEN,
    )?;
    let muscle_group = optional_text(
        "muscle_group",
        params.muscle_group.clone(),
        MAX_MUSCLE_GROUP_LEN,
    )?;
    let unit = match &params.unit {
        Some(u) => required_text("unit", u, MAX_UNIT_LEN)?,
        None => DEFAULT_UNIT.to_string(),
    };
    let measurement_mode = match &params.measurement_mode {
        Some(m) => m.parse::<MeasurementMode>()?,
        None => MeasurementMode::default(),
    };
    let rest = params
        .rest_seconds_preset
        .map(|r| non_negative_int("rest_seconds_preset", r))
        .transpose()?;

    let tx = write_tx(conn)?;
    tx.execute(
        "INSERT INTO exercises (
            name, description, muscle_group, unit,
            measurement_mode, rest_seconds_preset, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            name,
            description,
            muscle_group,
            unit,
            measurement_mode.as_str(),
            rest,
            now_ts(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    let exercise = get_exercise(&tx, id)?;
    tx.commit()?;

    tracing::debug!(exercise_id = id, "created exercise");
    Ok(exercise)
}

/// Retrieves an exercise by id.
pub fn get_exercise(conn: &Connection, id: i64) -> Result<Exercise, StoreError> {
    conn.query_row(
        &format!("{SELECT_EXERCISE} WHERE id = ?1"),
        [id],
        map_row_to_exercise,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("exercise", id))
}

/// Lists exercises in creation (id) order.
pub fn list_exercises(conn: &Connection, page: Page) -> Result<Vec<Exercise>, StoreError> {
    let (offset, limit) = page.resolve(DEFAULT_EXERCISE_PAGE);
    let mut stmt = conn.prepare(&format!(
        "{SELECT_EXERCISE} ORDER BY id ASC LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map([limit, offset], map_row_to_exercise)?;
    let mut exercises = Vec::new();
    for row in rows {
        exercises.push(row?);
    }
    Ok(exercises)
}

/// Applies a partial update and returns the updated exercise.
pub fn patch_exercise(
    conn: &Connection,
    id: i64,
    patch: &ExercisePatch,
) -> Result<Exercise, StoreError> {
    let mut updates = Assignments::new();

    if let Some(name) = &patch.name {
        let name = not_null("name", name.as_deref())?;
        updates.set("name", required_text("name", name, MAX_EXERCISE_NAME_LEN)?);
    }
    if let Some(description) = &patch.description {
        updates.set(
            "description",
            optional_text("description", description.clone(), MAX_DESCRIPTION_LEN)?,
        );
    }
    if let Some(group) = &patch.muscle_group {
        updates.set(
            "muscle_group",
            optional_text("muscle_group", group.clone(), MAX_MUSCLE_GROUP_LEN)?,
        );
    }
    if let Some(unit) = &patch.unit {
        let unit = not_null("unit", unit.as_deref())?;
        updates.set("unit", required_text("unit", unit, MAX_UNIT_LEN)?);
    }
    if let Some(mode) = &patch.measurement_mode {
        let mode = not_null("measurement_mode", mode.as_deref())?;
        updates.set("measurement_mode", mode.parse::<MeasurementMode>()?.as_str());
    }
    if let Some(rest) = patch.rest_seconds_preset {
        updates.set(
            "rest_seconds_preset",
            rest.map(|r| non_negative_int("rest_seconds_preset", r))
                .transpose()?,
        );
    }

    if updates.is_empty() {
        return get_exercise(conn, id);
    }

    let tx = write_tx(conn)?;
    if updates.apply(&tx, "exercises", &[("id", id)])? == 0 {
        return Err(StoreError::not_found("exercise", id));
    }
    let exercise = get_exercise(&tx, id)?;
    tx.commit()?;
    Ok(exercise)
}

/// Deletes an exercise.
///
/// Rejected with [`StoreError::Conflict`] while any set references it; the
/// caller must remove those sets (or their workouts) first.
pub fn delete_exercise(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let tx = write_tx(conn)?;

    if !row_exists(&tx, "exercises", id)? {
        return Err(StoreError::not_found("exercise", id));
    }

    let referencing: i64 = tx.query_row(
        "SELECT COUNT(*) FROM workout_sets WHERE exercise_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if referencing > 0 {
        return Err(StoreError::Conflict(format!(
            "exercise {id} is referenced by {referencing} set(s)"
        )));
    }

    tx.execute("DELETE FROM exercises WHERE id = ?1", [id])
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("exercise {id} is still referenced"))
            }
            other => StoreError::Database(other),
        })?;
    tx.commit()?;

    tracing::debug!(exercise_id = id, "deleted exercise");
    Ok(())
}

fn map_row_to_exercise(row: &Row) -> rusqlite::Result<Exercise> {
    let mode_str: String = row.get(5)?;
    let measurement_mode: MeasurementMode = mode_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        muscle_group: row.get(3)?,
        unit: row.get(4)?,
        measurement_mode,
        rest_seconds_preset: row.get(6)?,
        created_at: ts_column(row, 7)?,
    })
}
