//! Sets logged within a workout.
//!
//! Every set requires positive `reps` and `weight` whatever the exercise's
//! measurement mode. The mode is descriptive only: a timed plank is logged
//! as one rep at body weight with `duration_seconds` set.

use crate::records::detect_pr;
use crate::update::Assignments;
use crate::validate::{non_negative_int, not_null, optional_text, positive_int, positive_number};
use crate::{enum_column, now_ts, opt_ts_column, row_exists, write_tx, StoreError};
use chrono::{DateTime, Utc};
use ironlog_types::limits::{
    MAX_EXERCISES_PER_SESSION, MAX_SETS_PER_EXERCISE_PER_SESSION, MAX_SET_NOTES_LEN,
};
use ironlog_types::patch::nullable;
use ironlog_types::{PrType, SetLabel};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// One performed set of an exercise within a workout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_order: i64,
    pub reps: i64,
    pub weight: f64,
    pub duration_seconds: Option<i64>,
    pub notes: Option<String>,
    pub set_label: Option<SetLabel>,
    /// Whether this set broke a personal record when it was logged.
    pub is_pr: bool,
    pub pr_type: Option<PrType>,
    /// Seconds spent under load during the set.
    pub time_under_tension_seconds: Option<i64>,
    /// Rest taken after the set, in seconds.
    pub rest_seconds_after: Option<i64>,
    /// `None` for sets logged before creation times were recorded.
    pub created_at: Option<DateTime<Utc>>,
}

/// Parameters for adding a set to a workout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSet {
    pub exercise_id: i64,
    pub reps: i64,
    pub weight: f64,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub set_order: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// One of `warmup`, `working`, `failure`, `drop_set`.
    #[serde(default)]
    pub set_label: Option<String>,
    #[serde(default)]
    pub time_under_tension_seconds: Option<i64>,
    #[serde(default)]
    pub rest_seconds_after: Option<i64>,
}

/// Partial update for a set. The exercise a set belongs to cannot change,
/// and record flags are not recomputed. `null` is rejected for
/// `set_order`, `reps` and `weight`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub set_order: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub reps: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration_seconds: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub set_label: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub time_under_tension_seconds: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub rest_seconds_after: Option<Option<i64>>,
}

pub(crate) const SELECT_SET: &str = "SELECT
        id, workout_id, exercise_id, set_order, reps, weight, duration_seconds,
        notes, set_label, is_pr, pr_type, created_at,
        time_under_tension_seconds, rest_seconds_after
    FROM workout_sets";

fn optional_non_negative(field: &str, value: Option<i64>) -> Result<Option<i64>, StoreError> {
    value.map(|v| non_negative_int(field, v)).transpose()
}

fn parse_label(value: Option<&str>) -> Result<Option<SetLabel>, StoreError> {
    value.map(str::parse::<SetLabel>).transpose().map_err(Into::into)
}

/// Adds a set to an existing workout.
///
/// Both the workout and the exercise must exist; otherwise nothing is
/// written. The new set is checked against the exercise's history and
/// flagged when it breaks a personal record.
pub fn add_set(conn: &Connection, workout_id: i64, params: &NewSet) -> Result<WorkoutSet, StoreError> {
    let reps = positive_int("reps", params.reps)?;
    let weight = positive_number("weight", params.weight)?;
    let duration = params
        .duration_seconds
        .map(|d| positive_int("duration_seconds", d))
        .transpose()?;
    let set_order = non_negative_int("set_order", params.set_order.unwrap_or(0))?;
    let notes = optional_text("notes", params.notes.clone(), MAX_SET_NOTES_LEN)?;
    let set_label = parse_label(params.set_label.as_deref())?;
    let tut = optional_non_negative(
        "time_under_tension_seconds",
        params.time_under_tension_seconds,
    )?;
    let rest_after = optional_non_negative("rest_seconds_after", params.rest_seconds_after)?;

    let tx = write_tx(conn)?;

    if !row_exists(&tx, "workouts", workout_id)? {
        return Err(StoreError::not_found("workout", workout_id));
    }
    if !row_exists(&tx, "exercises", params.exercise_id)? {
        return Err(StoreError::not_found("exercise", params.exercise_id));
    }

    let (sets_for_exercise, distinct_exercises): (i64, i64) = tx.query_row(
        "SELECT
            COALESCE(SUM(exercise_id = ?2), 0),
            COUNT(DISTINCT exercise_id)
         FROM workout_sets
         WHERE workout_id = ?1",
        [workout_id, params.exercise_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    if sets_for_exercise >= MAX_SETS_PER_EXERCISE_PER_SESSION {
        return Err(StoreError::Validation(format!(
            "at most {MAX_SETS_PER_EXERCISE_PER_SESSION} sets per exercise per workout"
        )));
    }
    if sets_for_exercise == 0 && distinct_exercises >= MAX_EXERCISES_PER_SESSION {
        return Err(StoreError::Validation(format!(
            "at most {MAX_EXERCISES_PER_SESSION} exercises per workout"
        )));
    }

    let pr_type = detect_pr(&tx, params.exercise_id, weight, reps, duration)?;

    tx.execute(
        "INSERT INTO workout_sets (
            workout_id, exercise_id, set_order, reps, weight, duration_seconds,
            notes, set_label, is_pr, pr_type, created_at,
            time_under_tension_seconds, rest_seconds_after
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            workout_id,
            params.exercise_id,
            set_order,
            reps,
            weight,
            duration,
            notes,
            set_label.map(SetLabel::as_str),
            pr_type.is_some(),
            pr_type.map(PrType::as_str),
            now_ts(),
            tut,
            rest_after,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let set = get_set(&tx, workout_id, id)?;
    tx.commit()?;

    if let Some(pr) = pr_type {
        tracing::info!(
            workout_id,
            exercise_id = params.exercise_id,
            set_id = id,
            pr_type = %pr,
            "new personal record"
        );
    }
    Ok(set)
}

fn get_set(conn: &Connection, workout_id: i64, set_id: i64) -> Result<WorkoutSet, StoreError> {
    conn.query_row(
        &format!("{SELECT_SET} WHERE id = ?1 AND workout_id = ?2"),
        [set_id, workout_id],
        map_row_to_set,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("set", set_id))
}

/// Lists a workout's sets ordered by `set_order`, then id.
pub fn list_sets(conn: &Connection, workout_id: i64) -> Result<Vec<WorkoutSet>, StoreError> {
    if !row_exists(conn, "workouts", workout_id)? {
        return Err(StoreError::not_found("workout", workout_id));
    }

    let mut stmt = conn.prepare(&format!(
        "{SELECT_SET} WHERE workout_id = ?1 ORDER BY set_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map([workout_id], map_row_to_set)?;
    let mut sets = Vec::new();
    for row in rows {
        sets.push(row?);
    }
    Ok(sets)
}

/// Applies a partial update to a set belonging to `workout_id`.
pub fn patch_set(
    conn: &Connection,
    workout_id: i64,
    set_id: i64,
    patch: &SetPatch,
) -> Result<WorkoutSet, StoreError> {
    let mut updates = Assignments::new();

    if let Some(order) = patch.set_order {
        let order = not_null("set_order", order)?;
        updates.set("set_order", non_negative_int("set_order", order)?);
    }
    if let Some(reps) = patch.reps {
        let reps = not_null("reps", reps)?;
        updates.set("reps", positive_int("reps", reps)?);
    }
    if let Some(weight) = patch.weight {
        let weight = not_null("weight", weight)?;
        updates.set("weight", positive_number("weight", weight)?);
    }
    if let Some(duration) = patch.duration_seconds {
        updates.set(
            "duration_seconds",
            duration
                .map(|d| positive_int("duration_seconds", d))
                .transpose()?,
        );
    }
    if let Some(notes) = &patch.notes {
        updates.set(
            "notes",
            optional_text("notes", notes.clone(), MAX_SET_NOTES_LEN)?,
        );
    }
    if let Some(label) = &patch.set_label {
        updates.set(
            "set_label",
            parse_label(label.as_deref())?.map(SetLabel::as_str),
        );
    }
    if let Some(tut) = patch.time_under_tension_seconds {
        updates.set(
            "time_under_tension_seconds",
            optional_non_negative("time_under_tension_seconds", tut)?,
        );
    }
    if let Some(rest) = patch.rest_seconds_after {
        updates.set(
            "rest_seconds_after",
            optional_non_negative("rest_seconds_after", rest)?,
        );
    }

    if updates.is_empty() {
        return get_set(conn, workout_id, set_id);
    }

    let tx = write_tx(conn)?;
    if updates.apply(&tx, "workout_sets", &[("id", set_id), ("workout_id", workout_id)])? == 0 {
        return Err(StoreError::not_found("set", set_id));
    }
    let set = get_set(&tx, workout_id, set_id)?;
    tx.commit()?;
    Ok(set)
}

/// Removes a single set from a workout.
pub fn delete_set(conn: &Connection, workout_id: i64, set_id: i64) -> Result<(), StoreError> {
    let tx = write_tx(conn)?;
    let count = tx.execute(
        "DELETE FROM workout_sets WHERE id = ?1 AND workout_id = ?2",
        [set_id, workout_id],
    )?;
    if count == 0 {
        return Err(StoreError::not_found("set", set_id));
    }
    tx.commit()?;
    Ok(())
}

pub(crate) fn map_row_to_set(row: &Row) -> rusqlite::Result<WorkoutSet> {
    Ok(WorkoutSet {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_order: row.get(3)?,
        reps: row.get(4)?,
        weight: row.get(5)?,
        duration_seconds: row.get(6)?,
        notes: row.get(7)?,
        set_label: enum_column(row, 8)?,
        is_pr: row.get(9)?,
        pr_type: enum_column(row, 10)?,
        time_under_tension_seconds: row.get(12)?,
        rest_seconds_after: row.get(13)?,
        created_at: opt_ts_column(row, 11)?,
    })
}
