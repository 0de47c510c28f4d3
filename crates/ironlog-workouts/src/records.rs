//! Personal records: detection for newly logged sets and the trophy room
//! listing of records set in the current month or year.

use crate::{enum_column, format_ts, ts_column, StoreError};
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use ironlog_types::{ParseEnumError, PrType};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Compares a candidate set against every set already stored for
/// `exercise_id` and reports which record, if any, it would break.
///
/// Records are checked in priority order: heaviest weight, then best
/// single-set volume (`weight * reps`), then longest duration. The first
/// record that is strictly exceeded wins. The very first set for an
/// exercise counts as a weight record whenever its weight is positive.
pub fn detect_pr(
    conn: &Connection,
    exercise_id: i64,
    weight: f64,
    reps: i64,
    duration_seconds: Option<i64>,
) -> rusqlite::Result<Option<PrType>> {
    let (best_weight, best_volume, best_duration): (f64, f64, Option<i64>) = conn.query_row(
        "SELECT
            COALESCE(MAX(weight), 0),
            COALESCE(MAX(weight * reps), 0),
            MAX(duration_seconds)
         FROM workout_sets
         WHERE exercise_id = ?1",
        [exercise_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    if weight > best_weight {
        return Ok(Some(PrType::Weight));
    }
    if weight * reps as f64 > best_volume {
        return Ok(Some(PrType::Volume));
    }
    if let Some(duration) = duration_seconds {
        if duration > best_duration.unwrap_or(0) {
            return Ok(Some(PrType::Duration));
        }
    }
    Ok(None)
}

/// Calendar window for the trophy room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrPeriod {
    #[default]
    Month,
    Year,
}

impl PrPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Midnight UTC on the first day of the period containing `now`.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let first = now.date_naive().with_day(1)?;
        let first = match self {
            Self::Month => first,
            Self::Year => first.with_month(1)?,
        };
        Some(first.and_time(NaiveTime::MIN).and_utc())
    }
}

impl FromStr for PrPeriod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(ParseEnumError {
                kind: "period",
                value: s.to_string(),
                expected: "month, year",
            }),
        }
    }
}

/// A record-breaking set with the context needed to display it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrRecord {
    pub set_id: i64,
    pub workout_id: i64,
    pub workout_started_at: DateTime<Utc>,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub pr_type: Option<PrType>,
    pub weight: f64,
    pub reps: i64,
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrophyRoom {
    pub period: PrPeriod,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub count: usize,
    pub records: Vec<PrRecord>,
}

/// Lists sets flagged as personal records whose workout started within the
/// current `period`, most recent workout first.
pub fn trophy_room(
    conn: &Connection,
    period: PrPeriod,
    now: DateTime<Utc>,
) -> Result<TrophyRoom, StoreError> {
    let from = period.start(now).ok_or_else(|| {
        StoreError::Validation(format!("no {} period contains {now}", period.as_str()))
    })?;

    let mut stmt = conn.prepare(
        "SELECT
            s.id, s.workout_id, w.started_at, s.exercise_id, e.name,
            s.pr_type, s.weight, s.reps, s.duration_seconds
         FROM workout_sets s
         JOIN workouts w ON w.id = s.workout_id
         JOIN exercises e ON e.id = s.exercise_id
         WHERE s.is_pr = 1 AND w.started_at >= ?1
         ORDER BY w.started_at DESC, s.id DESC",
    )?;
    let rows = stmt.query_map([format_ts(&from)], map_row_to_record)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }

    Ok(TrophyRoom {
        period,
        from,
        to: now,
        count: records.len(),
        records,
    })
}

fn map_row_to_record(row: &Row) -> rusqlite::Result<PrRecord> {
    Ok(PrRecord {
        set_id: row.get(0)?,
        workout_id: row.get(1)?,
        workout_started_at: ts_column(row, 2)?,
        exercise_id: row.get(3)?,
        exercise_name: row.get(4)?,
        pr_type: enum_column(row, 5)?,
        weight: row.get(6)?,
        reps: row.get(7)?,
        duration_seconds: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use crate::{add_set, create_exercise, create_workout, NewExercise, NewSet, NewWorkout};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn seed(conn: &Connection, weight: f64, reps: i64, duration: Option<i64>) {
        conn.execute_batch(
            "INSERT OR IGNORE INTO exercises (id, name) VALUES (1, 'Row');
             INSERT OR IGNORE INTO workouts (id, started_at) VALUES (1, '2025-02-12T08:00:00Z');",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO workout_sets (workout_id, exercise_id, reps, weight, duration_seconds)
             VALUES (1, 1, ?1, ?2, ?3)",
            rusqlite::params![reps, weight, duration],
        )
        .unwrap();
    }

    #[test]
    fn first_set_is_a_weight_record() {
        let conn = setup_db();
        assert_eq!(detect_pr(&conn, 1, 40.0, 8, None).unwrap(), Some(PrType::Weight));
    }

    #[test]
    fn records_in_priority_order() {
        let conn = setup_db();
        seed(&conn, 100.0, 5, Some(60));

        assert_eq!(detect_pr(&conn, 1, 102.5, 1, None).unwrap(), Some(PrType::Weight));
        assert_eq!(detect_pr(&conn, 1, 90.0, 6, None).unwrap(), Some(PrType::Volume));
        assert_eq!(detect_pr(&conn, 1, 50.0, 5, Some(90)).unwrap(), Some(PrType::Duration));
        assert_eq!(detect_pr(&conn, 1, 100.0, 5, Some(60)).unwrap(), None);
    }

    #[test]
    fn other_exercises_do_not_count() {
        let conn = setup_db();
        seed(&conn, 100.0, 5, None);
        conn.execute("INSERT INTO exercises (id, name) VALUES (2, 'Curl')", [])
            .unwrap();
        assert_eq!(detect_pr(&conn, 2, 20.0, 10, None).unwrap(), Some(PrType::Weight));
    }

    #[test]
    fn period_start() {
        let now = at("2025-03-15T17:45:00Z");
        assert_eq!(PrPeriod::Month.start(now), Some(at("2025-03-01T00:00:00Z")));
        assert_eq!(PrPeriod::Year.start(now), Some(at("2025-01-01T00:00:00Z")));
        assert_eq!("year".parse::<PrPeriod>(), Ok(PrPeriod::Year));
        assert!("week".parse::<PrPeriod>().is_err());
    }

    #[test]
    fn trophy_room_lists_records_in_period() {
        let conn = setup_db();
        let squat = create_exercise(
            &conn,
            &NewExercise {
                name: "Squat".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        // Rising weights make every first set a record; the 50 kg back-off
        // set in March is not.
        for (started, weight) in [
            ("2024-12-20T08:00:00Z", 60.0),
            ("2025-01-10T08:00:00Z", 70.0),
            ("2025-03-02T08:00:00Z", 80.0),
        ] {
            let workout = create_workout(
                &conn,
                &NewWorkout {
                    started_at: Some(at(started)),
                    ..Default::default()
                },
            )
            .unwrap();
            let set = NewSet {
                exercise_id: squat.id,
                reps: 5,
                weight,
                ..Default::default()
            };
            add_set(&conn, workout.id, &set).unwrap();
            if weight == 80.0 {
                let back_off = NewSet { weight: 50.0, ..set };
                assert!(!add_set(&conn, workout.id, &back_off).unwrap().is_pr);
            }
        }

        let now = at("2025-03-15T12:00:00Z");
        let month = trophy_room(&conn, PrPeriod::Month, now).unwrap();
        assert_eq!(month.from, at("2025-03-01T00:00:00Z"));
        assert_eq!(month.to, now);
        assert_eq!(month.count, 1);
        assert_eq!(month.records[0].weight, 80.0);
        assert_eq!(month.records[0].exercise_name, "Squat");
        assert_eq!(month.records[0].pr_type, Some(PrType::Weight));

        let year = trophy_room(&conn, PrPeriod::Year, now).unwrap();
        let weights: Vec<f64> = year.records.iter().map(|r| r.weight).collect();
        assert_eq!(weights, [80.0, 70.0]);
        assert_eq!(year.count, 2);
    }
}
