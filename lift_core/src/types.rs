//! Core domain types for the LiftLog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and workout focus types
//! - Workouts and their lifecycle status
//! - Logged sets and the mutable input draft
//! - The input mode gating what the next submit does

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Exercise Types
// ============================================================================

/// An exercise definition (seeded or user-added)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscle_group: String,
}

// ============================================================================
// Workout Types
// ============================================================================

/// Broad focus of a workout session
///
/// Serialized as the integer code the remote API uses (1 through 6).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i64", into = "i64")]
pub enum WorkoutType {
    Legs,
    Chest,
    Back,
    Arms,
    Shoulders,
    FullBody,
}

impl WorkoutType {
    /// Wire code used by the remote API
    pub fn code(&self) -> i64 {
        match self {
            WorkoutType::Legs => 1,
            WorkoutType::Chest => 2,
            WorkoutType::Back => 3,
            WorkoutType::Arms => 4,
            WorkoutType::Shoulders => 5,
            WorkoutType::FullBody => 6,
        }
    }

    /// Inverse of [`WorkoutType::code`]
    pub fn from_code(code: i64) -> Option<WorkoutType> {
        match code {
            1 => Some(WorkoutType::Legs),
            2 => Some(WorkoutType::Chest),
            3 => Some(WorkoutType::Back),
            4 => Some(WorkoutType::Arms),
            5 => Some(WorkoutType::Shoulders),
            6 => Some(WorkoutType::FullBody),
            _ => None,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            WorkoutType::Legs => "Legs",
            WorkoutType::Chest => "Chest",
            WorkoutType::Back => "Back",
            WorkoutType::Arms => "Arms",
            WorkoutType::Shoulders => "Shoulders",
            WorkoutType::FullBody => "Full Body",
        }
    }

    /// Parse a user-supplied name such as `legs` or `full-body`
    pub fn parse(s: &str) -> Option<WorkoutType> {
        match s.trim().to_lowercase().as_str() {
            "legs" => Some(WorkoutType::Legs),
            "chest" => Some(WorkoutType::Chest),
            "back" => Some(WorkoutType::Back),
            "arms" => Some(WorkoutType::Arms),
            "shoulders" => Some(WorkoutType::Shoulders),
            "full-body" | "full body" | "fullbody" | "full" => Some(WorkoutType::FullBody),
            _ => None,
        }
    }
}

impl TryFrom<i64> for WorkoutType {
    type Error = String;

    fn try_from(code: i64) -> std::result::Result<Self, Self::Error> {
        WorkoutType::from_code(code).ok_or_else(|| format!("unknown workout type code {}", code))
    }
}

impl From<WorkoutType> for i64 {
    fn from(workout_type: WorkoutType) -> i64 {
        workout_type.code()
    }
}

/// Lifecycle state of a workout session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// A workout session as known to the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: i64,
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub notes: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// Snapshot taken when the session ends; duration derives from it
    pub ended_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Set Types
// ============================================================================

/// Cadence style of a lift
///
/// Serialized as the kebab-case strings the remote API uses.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Tempo {
    Normal,
    Pause,
    TouchAndGo,
    FullReset,
    SlowEccentric,
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo::Normal
    }
}

impl Tempo {
    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Tempo::Normal => "Normal",
            Tempo::Pause => "Pause",
            Tempo::TouchAndGo => "Touch & Go",
            Tempo::FullReset => "Full Reset",
            Tempo::SlowEccentric => "Slow Eccentric",
        }
    }

    /// Parse a user-supplied name such as `pause` or `touch-and-go`
    pub fn parse(s: &str) -> Option<Tempo> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(Tempo::Normal),
            "pause" => Some(Tempo::Pause),
            "touch-and-go" => Some(Tempo::TouchAndGo),
            "full-reset" => Some(Tempo::FullReset),
            "slow-eccentric" => Some(Tempo::SlowEccentric),
            _ => None,
        }
    }
}

/// A logged set as stored by the persistence collaborator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    /// Position within the exercise; drop-sets reuse their parent's number
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub feel_rating: u8,
    pub rpe: Option<f64>,
    pub tempo: Tempo,
    pub rest_seconds: u32,
    pub is_dropset: bool,
    pub dropset_parent_id: Option<i64>,
    pub notes: String,
}

impl SetRecord {
    /// Volume contribution of this record (aggregation only, never stored)
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// Neutral default for the feel rating on a fresh draft
pub const DEFAULT_FEEL_RATING: u8 = 7;

/// Mutable input fields for the next submission
///
/// Owned by the session and passed explicitly; clearing after a successful
/// submit resets everything except the selected exercise.
#[derive(Clone, Debug, PartialEq)]
pub struct SetDraft {
    pub exercise_id: Option<i64>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub feel_rating: u8,
    pub rpe: Option<f64>,
    pub tempo: Tempo,
    pub notes: String,
}

impl Default for SetDraft {
    fn default() -> Self {
        Self {
            exercise_id: None,
            weight: None,
            reps: None,
            feel_rating: DEFAULT_FEEL_RATING,
            rpe: None,
            tempo: Tempo::Normal,
            notes: String::new(),
        }
    }
}

impl SetDraft {
    /// Reset to defaults, keeping the selected exercise
    pub fn clear(&mut self) {
        let exercise_id = self.exercise_id;
        *self = SetDraft::default();
        self.exercise_id = exercise_id;
    }
}

/// What the next submit will do
///
/// A single tagged value instead of independent editing/drop-set flags, so
/// the combined state can never exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Fresh submission appending a new record
    Idle,
    /// Submission replaces the fields of the referenced record
    Editing(i64),
    /// Submission logs a drop-set of the referenced parent
    PendingDropset(i64),
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Idle
    }
}

// ============================================================================
// User Types
// ============================================================================

/// The authenticated user as reported by the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
}
