//! Shared types, field bounds, and constants for the Ironlog service.
//!
//! This crate holds the enumerations that are persisted as text columns
//! (`Intensity`, `MeasurementMode`, `SetLabel`, `PrType`) together with the
//! length and count limits enforced before anything is written.
//!
//! Every enumeration serializes to the same lowercase snake_case string that
//! is stored in SQLite, so the JSON wire form and the column value agree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod limits;
pub mod patch;

/// Error returned when a string does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    /// Which enumeration was being parsed (e.g. "intensity").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated list of accepted values.
    pub expected: &'static str,
}

/// Workout intensity classifier, used to pick a MET value for calorie
/// estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    /// Resistance training, multiple exercises, 8-15 reps.
    Light,
    /// General gym work: squats, deadlifts.
    Moderate,
    /// Free weights, powerlifting, bodybuilding.
    Vigorous,
}

impl Intensity {
    /// All accepted values, in ascending order of effort.
    pub const ALL: [Intensity; 3] = [Self::Light, Self::Moderate, Self::Vigorous];

    /// Returns the stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Vigorous => "vigorous",
        }
    }
}

impl FromStr for Intensity {
    type Err = ParseEnumError;

    /// Parses case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "vigorous" => Ok(Self::Vigorous),
            _ => Err(ParseEnumError {
                kind: "intensity",
                value: s.to_string(),
                expected: "light, moderate, vigorous",
            }),
        }
    }
}

/// How an exercise is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMode {
    /// Weight and reps.
    #[default]
    WeightReps,
    /// Time-based (e.g. planks).
    Time,
    /// Bodyweight reps only.
    BodyweightReps,
}

impl MeasurementMode {
    /// Returns the stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WeightReps => "weight_reps",
            Self::Time => "time",
            Self::BodyweightReps => "bodyweight_reps",
        }
    }
}

impl FromStr for MeasurementMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight_reps" => Ok(Self::WeightReps),
            "time" => Ok(Self::Time),
            "bodyweight_reps" => Ok(Self::BodyweightReps),
            _ => Err(ParseEnumError {
                kind: "measurement mode",
                value: s.to_string(),
                expected: "weight_reps, time, bodyweight_reps",
            }),
        }
    }
}

/// Label attached to a single set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetLabel {
    Warmup,
    Working,
    Failure,
    DropSet,
}

impl SetLabel {
    /// Returns the stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Working => "working",
            Self::Failure => "failure",
            Self::DropSet => "drop_set",
        }
    }
}

impl FromStr for SetLabel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warmup" => Ok(Self::Warmup),
            "working" => Ok(Self::Working),
            "failure" => Ok(Self::Failure),
            "drop_set" => Ok(Self::DropSet),
            _ => Err(ParseEnumError {
                kind: "set label",
                value: s.to_string(),
                expected: "warmup, working, failure, drop_set",
            }),
        }
    }
}

/// Kind of personal record a set achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrType {
    /// Heaviest weight lifted for the exercise.
    Weight,
    /// Highest single-set volume (weight x reps).
    Volume,
    /// Longest duration.
    Duration,
}

impl PrType {
    /// Returns the stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Volume => "volume",
            Self::Duration => "duration",
        }
    }
}

impl FromStr for PrType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" => Ok(Self::Weight),
            "volume" => Ok(Self::Volume),
            "duration" => Ok(Self::Duration),
            _ => Err(ParseEnumError {
                kind: "pr type",
                value: s.to_string(),
                expected: "weight, volume, duration",
            }),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
