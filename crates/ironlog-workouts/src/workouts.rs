//! Workout sessions.

use crate::sets::{list_sets, WorkoutSet};
use crate::update::Assignments;
use crate::validate::{non_negative_int, not_null, optional_text};
use crate::{format_ts, now_ts, opt_ts_column, ts_column, write_tx, Page, StoreError};
use chrono::{DateTime, Utc};
use ironlog_types::limits::{DEFAULT_WORKOUT_PAGE, MAX_WORKOUT_NOTES_LEN};
use ironlog_types::patch::nullable;
use ironlog_types::Intensity;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// A logged training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: i64,
    /// When the session took place.
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub notes: Option<String>,
    /// `None` means unknown; calorie estimation then yields no estimate.
    pub intensity: Option<Intensity>,
    pub created_at: DateTime<Utc>,
}

/// A workout together with its sets, ordered by `set_order` then id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub sets: Vec<WorkoutSet>,
}

/// Parameters for creating a workout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewWorkout {
    /// Defaults to the current time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Derived from `ended_at - started_at` when omitted.
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// One of `light`, `moderate`, `vigorous`, or absent.
    #[serde(default)]
    pub intensity: Option<String>,
}

/// Partial update for a workout. Absent fields are left untouched; an
/// explicit `null` clears a nullable field and is rejected for `started_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkoutPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub started_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub ended_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration_seconds: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub intensity: Option<Option<String>>,
}

/// Listing filter: an inclusive `started_at` range plus paging.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WorkoutFilter {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

const SELECT_WORKOUT: &str = "SELECT
        id, started_at, ended_at, duration_seconds, notes, intensity, created_at
    FROM workouts";

fn parse_intensity(value: Option<&str>) -> Result<Option<Intensity>, StoreError> {
    value.map(str::parse::<Intensity>).transpose().map_err(Into::into)
}

fn derived_duration(started: DateTime<Utc>, ended: DateTime<Utc>) -> i64 {
    (ended - started).num_seconds().max(0)
}

/// Creates a new workout and returns it as stored.
pub fn create_workout(conn: &Connection, params: &NewWorkout) -> Result<Workout, StoreError> {
    let intensity = parse_intensity(params.intensity.as_deref())?;
    let notes = optional_text("notes", params.notes.clone(), MAX_WORKOUT_NOTES_LEN)?;
    let started_at = params.started_at.unwrap_or_else(Utc::now);
    let duration = match (params.duration_seconds, params.ended_at) {
        (Some(d), _) => Some(non_negative_int("duration_seconds", d)?),
        (None, Some(ended)) => Some(derived_duration(started_at, ended)),
        (None, None) => None,
    };

    let tx = write_tx(conn)?;
    tx.execute(
        "INSERT INTO workouts (
            started_at, ended_at, duration_seconds, notes, intensity, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            format_ts(&started_at),
            params.ended_at.as_ref().map(format_ts),
            duration,
            notes,
            intensity.map(Intensity::as_str),
            now_ts(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    let workout = get_workout(&tx, id)?;
    tx.commit()?;

    tracing::debug!(workout_id = id, "created workout");
    Ok(workout)
}

/// Retrieves a workout by id, without its sets.
pub fn get_workout(conn: &Connection, id: i64) -> Result<Workout, StoreError> {
    conn.query_row(
        &format!("{SELECT_WORKOUT} WHERE id = ?1"),
        [id],
        map_row_to_workout,
    )
    .optional()?
    .ok_or_else(|| StoreError::not_found("workout", id))
}

/// Retrieves a workout with all of its sets.
pub fn get_workout_detail(conn: &Connection, id: i64) -> Result<WorkoutDetail, StoreError> {
    let workout = get_workout(conn, id)?;
    let sets = list_sets(conn, id)?;
    Ok(WorkoutDetail { workout, sets })
}

/// Lists workouts, most recent first.
pub fn list_workouts(conn: &Connection, filter: WorkoutFilter) -> Result<Vec<Workout>, StoreError> {
    let (offset, limit) = Page {
        offset: filter.offset,
        limit: filter.limit,
    }
    .resolve(DEFAULT_WORKOUT_PAGE);

    let mut stmt = conn.prepare(&format!(
        "{SELECT_WORKOUT}
         WHERE (?1 IS NULL OR started_at >= ?1)
           AND (?2 IS NULL OR started_at <= ?2)
         ORDER BY started_at DESC, id DESC
         LIMIT ?3 OFFSET ?4"
    ))?;

    let rows = stmt.query_map(
        params![
            filter.from.as_ref().map(format_ts),
            filter.to.as_ref().map(format_ts),
            limit,
            offset,
        ],
        map_row_to_workout,
    )?;
    let mut workouts = Vec::new();
    for row in rows {
        workouts.push(row?);
    }
    Ok(workouts)
}

/// Applies a partial update and returns the updated workout.
///
/// Setting `ended_at` without an explicit `duration_seconds` recomputes the
/// duration from the (possibly also patched) `started_at`.
pub fn patch_workout(
    conn: &Connection,
    id: i64,
    patch: &WorkoutPatch,
) -> Result<Workout, StoreError> {
    let new_start = patch
        .started_at
        .map(|value| not_null("started_at", value))
        .transpose()?;
    let intensity = match &patch.intensity {
        Some(value) => Some(parse_intensity(value.as_deref())?),
        None => None,
    };
    let notes = match &patch.notes {
        Some(value) => Some(optional_text(
            "notes",
            value.clone(),
            MAX_WORKOUT_NOTES_LEN,
        )?),
        None => None,
    };
    let duration = match patch.duration_seconds {
        Some(value) => Some(
            value
                .map(|d| non_negative_int("duration_seconds", d))
                .transpose()?,
        ),
        None => None,
    };

    let tx = write_tx(conn)?;
    let current = get_workout(&tx, id)?;
    let started_at = new_start.unwrap_or(current.started_at);

    let mut updates = Assignments::new();
    if let Some(started) = &new_start {
        updates.set("started_at", format_ts(started));
    }
    if let Some(ended) = patch.ended_at {
        updates.set("ended_at", ended.as_ref().map(format_ts));
        if let (None, Some(end)) = (duration, ended) {
            updates.set("duration_seconds", Some(derived_duration(started_at, end)));
        }
    }
    if let Some(duration) = duration {
        updates.set("duration_seconds", duration);
    }
    if let Some(notes) = notes {
        updates.set("notes", notes);
    }
    if let Some(intensity) = intensity {
        updates.set("intensity", intensity.map(Intensity::as_str));
    }

    if updates.is_empty() {
        return Ok(current);
    }

    updates.apply(&tx, "workouts", &[("id", id)])?;
    let workout = get_workout(&tx, id)?;
    tx.commit()?;
    Ok(workout)
}

/// Deletes a workout together with all of its sets.
pub fn delete_workout(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let tx = write_tx(conn)?;
    let removed_sets = tx.execute("DELETE FROM workout_sets WHERE workout_id = ?1", [id])?;
    let count = tx.execute("DELETE FROM workouts WHERE id = ?1", [id])?;
    if count == 0 {
        // Dropping the transaction rolls back; no sets can exist for a
        // missing workout anyway.
        return Err(StoreError::not_found("workout", id));
    }
    tx.commit()?;

    tracing::debug!(workout_id = id, removed_sets, "deleted workout");
    Ok(())
}

fn map_row_to_workout(row: &Row) -> rusqlite::Result<Workout> {
    let intensity_str: Option<String> = row.get(5)?;
    let intensity = match intensity_str {
        Some(s) => match s.parse::<Intensity>() {
            Ok(i) => Some(i),
            Err(e) => {
                // Rows written before validation existed; read as unknown.
                tracing::warn!(error = %e, "unrecognized stored intensity, treating as unknown");
                None
            }
        },
        None => None,
    };

    Ok(Workout {
        id: row.get(0)?,
        started_at: ts_column(row, 1)?,
        ended_at: opt_ts_column(row, 2)?,
        duration_seconds: row.get(3)?,
        notes: row.get(4)?,
        intensity,
        created_at: ts_column(row, 6)?,
    })
}
