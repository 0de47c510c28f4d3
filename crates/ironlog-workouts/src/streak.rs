//! Consecutive-day training streaks.

use crate::StoreError;
use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// How far back workouts are considered when computing streaks.
pub const STREAK_LOOKBACK_DAYS: u64 = 430;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Streak {
    /// Consecutive training days ending today or yesterday; zero otherwise.
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_workout_date: Option<NaiveDate>,
}

/// Computes streaks from the UTC dates on which workouts started.
pub fn workout_streak(conn: &Connection, today: NaiveDate) -> Result<Streak, StoreError> {
    let since = today
        .checked_sub_days(Days::new(STREAK_LOOKBACK_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let mut stmt = conn.prepare(
        "SELECT DISTINCT substr(started_at, 1, 10) AS day
         FROM workouts
         WHERE started_at >= ?1
         ORDER BY day DESC",
    )?;
    let rows = stmt.query_map([since.format("%Y-%m-%d").to_string()], |row| {
        let day: String = row.get(0)?;
        NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    })?;
    let mut days = Vec::new();
    for row in rows {
        days.push(row?);
    }

    Ok(streak_from_days(&days, today))
}

/// `days` must be distinct and sorted newest first.
fn streak_from_days(days: &[NaiveDate], today: NaiveDate) -> Streak {
    let Some(&last) = days.first() else {
        return Streak::default();
    };

    let mut latest_run = None;
    let mut longest = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if pair[0].pred_opt() == Some(pair[1]) {
            run += 1;
        } else {
            latest_run.get_or_insert(run);
            run = 1;
        }
        longest = longest.max(run);
    }
    let latest_run = latest_run.unwrap_or(run);

    let yesterday = today.pred_opt().unwrap_or(today);
    Streak {
        current_streak: if last >= yesterday { latest_run } else { 0 },
        longest_streak: longest,
        last_workout_date: Some(last),
    }
}
