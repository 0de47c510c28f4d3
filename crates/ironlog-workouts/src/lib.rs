//! The workout data store.
//!
//! Implements exercise, workout and set CRUD on top of the schema created by
//! `ironlog-db`, plus the derived views the service exposes: personal-record
//! flags on new sets, the trophy room, per-exercise history and statistics,
//! training streaks and a MET-based calorie estimate.
//!
//! Every operation takes a `&rusqlite::Connection`. Inputs arrive as plain
//! parameter records, are validated before anything is written, and every
//! create/update/delete runs inside a single `IMMEDIATE` transaction so that
//! either all of its row changes land or none do.
//!
//! Referential policy: deleting a workout cascades to its sets; deleting an
//! exercise that any set still references is rejected with
//! [`StoreError::Conflict`].

pub mod calories;
mod exercises;
mod history;
mod records;
mod sets;
mod streak;
mod update;
mod validate;
mod workouts;

pub use exercises::{
    create_exercise, delete_exercise, get_exercise, list_exercises, patch_exercise, Exercise,
    ExercisePatch, NewExercise,
};
pub use history::{
    exercise_stats, previous_session, BestMarks, DailyProgress, ExerciseStats, LabelCount,
    PreviousSession, SessionSets, RECENT_SESSIONS,
};
pub use records::{detect_pr, trophy_room, PrPeriod, PrRecord, TrophyRoom};
pub use sets::{add_set, delete_set, list_sets, patch_set, NewSet, SetPatch, WorkoutSet};
pub use streak::{workout_streak, Streak, STREAK_LOOKBACK_DAYS};
pub use workouts::{
    create_workout, delete_workout, get_workout, get_workout_detail, list_workouts,
    patch_workout, NewWorkout, Workout, WorkoutDetail, WorkoutFilter, WorkoutPatch,
};

use chrono::{DateTime, SecondsFormat, Utc};
use ironlog_types::ParseEnumError;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or out-of-range input. Nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),
    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// The operation would break referential integrity.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Returns `true` when the database was busy or locked past the busy
    /// timeout, i.e. the store is temporarily unavailable rather than broken.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(rusqlite::Error::SqliteFailure(err, _))
                if matches!(
                    err.code,
                    rusqlite::ffi::ErrorCode::DatabaseBusy | rusqlite::ffi::ErrorCode::DatabaseLocked
                )
        )
    }
}

impl From<ParseEnumError> for StoreError {
    fn from(e: ParseEnumError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

/// Offset/limit paging for listings. Missing values fall back to the
/// per-listing default; `limit` is capped at [`ironlog_types::limits::MAX_PAGE`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl Page {
    pub(crate) fn resolve(self, default_limit: u32) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(default_limit)
            .min(ironlog_types::limits::MAX_PAGE);
        (i64::from(self.offset.unwrap_or(0)), i64::from(limit))
    }
}

/// Opens a write transaction that takes the database write lock up front, so
/// the existence checks it performs cannot be invalidated before commit.
pub(crate) fn write_tx(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

/// Canonical stored form of a timestamp: RFC 3339, UTC, millisecond precision.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn now_ts() -> String {
    format_ts(&Utc::now())
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn ts_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(idx, &raw)
}

pub(crate) fn opt_ts_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

/// Reads a nullable text column holding one of the stored enumerations.
pub(crate) fn enum_column<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr<Err = ParseEnumError>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Returns whether a row with `id` exists in `table`.
pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )
}
