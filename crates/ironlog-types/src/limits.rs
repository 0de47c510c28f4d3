//! Field bounds and per-session limits.

/// Maximum length of an exercise name.
pub const MAX_EXERCISE_NAME_LEN: usize = 255;
/// Maximum length of an exercise description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum length of a muscle group label.
pub const MAX_MUSCLE_GROUP_LEN: usize = 100;
/// Maximum length of a unit label (matches the `VARCHAR(20)` column).
pub const MAX_UNIT_LEN: usize = 20;
/// Maximum length of free-text workout notes.
pub const MAX_WORKOUT_NOTES_LEN: usize = 10_000;
/// Maximum length of per-set notes.
pub const MAX_SET_NOTES_LEN: usize = 500;
/// Width of the `workouts.intensity` column.
pub const INTENSITY_COLUMN_WIDTH: usize = 20;

/// Maximum sets of one exercise within a single workout.
pub const MAX_SETS_PER_EXERCISE_PER_SESSION: i64 = 10;
/// Maximum distinct exercises within a single workout.
pub const MAX_EXERCISES_PER_SESSION: i64 = 20;

/// Default page size for exercise listings.
pub const DEFAULT_EXERCISE_PAGE: u32 = 100;
/// Default page size for workout listings.
pub const DEFAULT_WORKOUT_PAGE: u32 = 50;
/// Hard cap on any listing page.
pub const MAX_PAGE: u32 = 200;
