//! Per-exercise history: the previous session and aggregate statistics.

use crate::sets::{map_row_to_set, WorkoutSet, SELECT_SET};
use crate::{opt_ts_column, row_exists, ts_column, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Workouts included in [`ExerciseStats::recent_history`].
pub const RECENT_SESSIONS: i64 = 10;

/// Brzycki estimate of the one-rep max for a set. From 37 reps on the
/// formula breaks down, so a flat 10% over the working weight is used.
const ONE_REP_MAX_SQL: &str = "CASE
        WHEN s.reps >= 37 THEN s.weight * 1.1
        ELSE s.weight * 36.0 / (37 - s.reps)
    END";

/// The sets of one exercise from the most recent workout that included it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviousSession {
    pub exercise_id: i64,
    /// `None` when the exercise has never been performed.
    pub workout_id: Option<i64>,
    pub workout_started_at: Option<DateTime<Utc>>,
    pub sets: Vec<WorkoutSet>,
}

/// An exercise's sets within a single workout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSets {
    pub workout_id: i64,
    pub started_at: DateTime<Utc>,
    pub sets: Vec<WorkoutSet>,
}

/// All-time bests, rounded to two decimals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BestMarks {
    pub best_weight: Option<f64>,
    pub best_reps: Option<i64>,
    pub best_volume: Option<f64>,
    #[serde(rename = "best_1rm")]
    pub best_one_rep_max: Option<f64>,
    pub best_duration: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelCount {
    /// `unlabeled` for sets without a label.
    pub label: String,
    pub count: i64,
}

/// Per-day totals for one exercise, keyed by the UTC date the workout started.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    #[serde(rename = "estimated_1rm")]
    pub estimated_one_rep_max: f64,
    pub volume: f64,
    pub max_weight: f64,
    pub sets: i64,
    pub reps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseStats {
    pub exercise_id: i64,
    pub total_sets: i64,
    pub total_workouts: i64,
    pub first_performed: Option<DateTime<Utc>>,
    pub last_performed: Option<DateTime<Utc>>,
    pub prs: BestMarks,
    pub set_label_distribution: Vec<LabelCount>,
    pub progression: Vec<DailyProgress>,
    pub recent_history: Vec<SessionSets>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sets_in_workout(
    conn: &Connection,
    workout_id: i64,
    exercise_id: i64,
) -> Result<Vec<WorkoutSet>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "{SELECT_SET} WHERE workout_id = ?1 AND exercise_id = ?2 ORDER BY set_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map([workout_id, exercise_id], map_row_to_set)?;
    let mut sets = Vec::new();
    for row in rows {
        sets.push(row?);
    }
    Ok(sets)
}

/// Returns the exercise's sets from its most recent workout, skipping
/// `exclude_workout_id` (typically the session currently being logged).
pub fn previous_session(
    conn: &Connection,
    exercise_id: i64,
    exclude_workout_id: Option<i64>,
) -> Result<PreviousSession, StoreError> {
    if !row_exists(conn, "exercises", exercise_id)? {
        return Err(StoreError::not_found("exercise", exercise_id));
    }

    let latest = conn
        .query_row(
            "SELECT w.id, w.started_at
             FROM workouts w
             WHERE EXISTS (
                 SELECT 1 FROM workout_sets s
                 WHERE s.workout_id = w.id AND s.exercise_id = ?1
             )
               AND (?2 IS NULL OR w.id != ?2)
             ORDER BY w.started_at DESC, w.id DESC
             LIMIT 1",
            params![exercise_id, exclude_workout_id],
            |row| Ok((row.get::<_, i64>(0)?, ts_column(row, 1)?)),
        )
        .optional()?;

    let Some((workout_id, started_at)) = latest else {
        return Ok(PreviousSession {
            exercise_id,
            workout_id: None,
            workout_started_at: None,
            sets: Vec::new(),
        });
    };

    Ok(PreviousSession {
        exercise_id,
        workout_id: Some(workout_id),
        workout_started_at: Some(started_at),
        sets: sets_in_workout(conn, workout_id, exercise_id)?,
    })
}

/// Aggregates an exercise's full history.
pub fn exercise_stats(conn: &Connection, exercise_id: i64) -> Result<ExerciseStats, StoreError> {
    if !row_exists(conn, "exercises", exercise_id)? {
        return Err(StoreError::not_found("exercise", exercise_id));
    }

    let (total_sets, total_workouts, first_performed, last_performed, prs) = conn.query_row(
        &format!(
            "SELECT
                COUNT(*), COUNT(DISTINCT s.workout_id),
                MIN(w.started_at), MAX(w.started_at),
                MAX(s.weight), MAX(s.reps), MAX(s.weight * s.reps),
                MAX({ONE_REP_MAX_SQL}), MAX(s.duration_seconds)
             FROM workout_sets s
             JOIN workouts w ON w.id = s.workout_id
             WHERE s.exercise_id = ?1"
        ),
        [exercise_id],
        |row| {
            let prs = BestMarks {
                best_weight: row.get::<_, Option<f64>>(4)?.map(round2),
                best_reps: row.get(5)?,
                best_volume: row.get::<_, Option<f64>>(6)?.map(round2),
                best_one_rep_max: row.get::<_, Option<f64>>(7)?.map(round2),
                best_duration: row.get(8)?,
            };
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                opt_ts_column(row, 2)?,
                opt_ts_column(row, 3)?,
                prs,
            ))
        },
    )?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(set_label, 'unlabeled') AS label, COUNT(*) AS n
         FROM workout_sets
         WHERE exercise_id = ?1
         GROUP BY label
         ORDER BY n DESC, label ASC",
    )?;
    let rows = stmt.query_map([exercise_id], |row| {
        Ok(LabelCount {
            label: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    let mut set_label_distribution = Vec::new();
    for row in rows {
        set_label_distribution.push(row?);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT
            substr(w.started_at, 1, 10) AS day,
            MAX({ONE_REP_MAX_SQL}), SUM(s.weight * s.reps), MAX(s.weight),
            COUNT(*), SUM(s.reps)
         FROM workout_sets s
         JOIN workouts w ON w.id = s.workout_id
         WHERE s.exercise_id = ?1
         GROUP BY day
         ORDER BY day ASC"
    ))?;
    let rows = stmt.query_map([exercise_id], map_row_to_progress)?;
    let mut progression = Vec::new();
    for row in rows {
        progression.push(row?);
    }

    let mut stmt = conn.prepare(
        "SELECT w.id, w.started_at
         FROM workouts w
         WHERE EXISTS (
             SELECT 1 FROM workout_sets s
             WHERE s.workout_id = w.id AND s.exercise_id = ?1
         )
         ORDER BY w.started_at DESC, w.id DESC
         LIMIT ?2",
    )?;
    let sessions = stmt.query_map([exercise_id, RECENT_SESSIONS], |row| {
        Ok((row.get::<_, i64>(0)?, ts_column(row, 1)?))
    })?;
    let mut recent_history = Vec::new();
    for session in sessions {
        let (workout_id, started_at) = session?;
        recent_history.push(SessionSets {
            workout_id,
            started_at,
            sets: sets_in_workout(conn, workout_id, exercise_id)?,
        });
    }

    Ok(ExerciseStats {
        exercise_id,
        total_sets,
        total_workouts,
        first_performed,
        last_performed,
        prs,
        set_label_distribution,
        progression,
        recent_history,
    })
}

fn map_row_to_progress(row: &Row) -> rusqlite::Result<DailyProgress> {
    let day: String = row.get(0)?;
    let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DailyProgress {
        date,
        estimated_one_rep_max: round2(row.get(1)?),
        volume: round2(row.get(2)?),
        max_weight: row.get(3)?,
        sets: row.get(4)?,
        reps: row.get(5)?,
    })
}
