//! MET-based calorie estimation.
//!
//! `kcal = MET * 3.5 * body_weight_kg / 200 * minutes`, rounded to one
//! decimal place. Without an intensity there is no MET value and therefore
//! no estimate.

use crate::WorkoutDetail;
use ironlog_types::Intensity;

pub const MET_LIGHT: f64 = 3.5;
pub const MET_MODERATE: f64 = 5.0;
pub const MET_VIGOROUS: f64 = 6.0;

/// Assumed minutes per set when a workout has no recorded duration.
pub const MINUTES_PER_SET: f64 = 2.5;

pub fn met_for(intensity: Intensity) -> f64 {
    match intensity {
        Intensity::Light => MET_LIGHT,
        Intensity::Moderate => MET_MODERATE,
        Intensity::Vigorous => MET_VIGOROUS,
    }
}

/// Active minutes: the recorded duration when positive, otherwise an
/// estimate from the number of sets.
pub fn active_minutes(duration_seconds: Option<i64>, set_count: usize) -> f64 {
    match duration_seconds {
        Some(secs) if secs > 0 => secs as f64 / 60.0,
        _ => set_count as f64 * MINUTES_PER_SET,
    }
}

/// Returns `None` when intensity or a positive body weight is missing, or
/// when there are no active minutes.
pub fn estimate_calories(
    intensity: Option<Intensity>,
    body_weight_kg: Option<f64>,
    minutes: f64,
) -> Option<f64> {
    let met = met_for(intensity?);
    let weight = body_weight_kg.filter(|w| w.is_finite() && *w > 0.0)?;
    if minutes <= 0.0 {
        return None;
    }
    let kcal = met * 3.5 * weight / 200.0 * minutes;
    Some((kcal * 10.0).round() / 10.0)
}

/// Estimates calories burned for a stored workout.
pub fn estimate_for_workout(detail: &WorkoutDetail, body_weight_kg: Option<f64>) -> Option<f64> {
    let minutes = active_minutes(detail.workout.duration_seconds, detail.sets.len());
    estimate_calories(detail.workout.intensity, body_weight_kg, minutes)
}
