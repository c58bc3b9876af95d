//! Storage abstraction for workout data.
//!
//! [`WorkoutStore`] is the seam between a live session and whatever
//! persists its records: the remote API in normal use, or an in-memory
//! store for offline sessions and tests. The session only mutates its
//! local state after a store call has succeeded, so implementations
//! must either apply an operation fully or return an error.

use chrono::{NaiveDate, Utc};

use crate::catalog::seed_exercises;
use crate::error::{Error, Result};
use crate::types::{
    Exercise, SessionStatus, SetRecord, Tempo, UserProfile, Workout, WorkoutType,
};

// ============================================================================
// Write payloads
// ============================================================================

/// Field set for creating or overwriting a set record.
///
/// Carries no `id` or server-assigned data: the store assigns identity
/// on create, and an update addresses an existing id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSet {
    pub workout_id: i64,
    pub exercise_id: i64,
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

// ============================================================================
// Store trait
// ============================================================================

/// Backend holding exercises, workouts and set records.
pub trait WorkoutStore {
    /// Profile of the authenticated (or local) user
    fn current_user(&mut self) -> Result<UserProfile>;

    /// All known exercises, seeded plus user-added
    fn list_exercises(&mut self) -> Result<Vec<Exercise>>;

    /// Add an exercise to the catalog; duplicate names are rejected
    fn create_exercise(&mut self, name: &str, muscle_group: &str) -> Result<Exercise>;

    /// Open a new workout
    fn create_workout(
        &mut self,
        date: NaiveDate,
        workout_type: WorkoutType,
        notes: &str,
    ) -> Result<Workout>;

    /// Close a workout
    fn end_workout(&mut self, workout_id: i64) -> Result<()>;

    /// Persist a new set and return it with its assigned identity
    fn create_set(&mut self, set: &NewSet) -> Result<SetRecord>;

    /// Overwrite an existing set, keeping its identity
    fn update_set(&mut self, set_id: i64, set: &NewSet) -> Result<SetRecord>;

    /// Remove a set
    fn delete_set(&mut self, set_id: i64) -> Result<()>;

    /// Record a body-weight measurement
    fn record_body_weight(&mut self, date: NaiveDate, weight: f64) -> Result<()>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store keeping everything in memory.
///
/// Used for offline sessions and as the test double for the session
/// state machine. Starts pre-seeded with the standard exercises, so its
/// ids line up with [`crate::catalog::seed_exercises`].
#[derive(Clone, Debug)]
pub struct MemoryStore {
    exercises: Vec<Exercise>,
    workouts: Vec<Workout>,
    sets: Vec<SetRecord>,
    body_weights: Vec<(NaiveDate, f64)>,
    next_exercise_id: i64,
    next_workout_id: i64,
    next_set_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let exercises = seed_exercises().to_vec();
        let next_exercise_id = exercises.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            exercises,
            workouts: Vec::new(),
            sets: Vec::new(),
            body_weights: Vec::new(),
            next_exercise_id,
            next_workout_id: 1,
            next_set_id: 1,
        }
    }

    /// All stored sets, in insertion order
    pub fn sets(&self) -> &[SetRecord] {
        &self.sets
    }

    /// All stored workouts, in insertion order
    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// All recorded body-weight measurements
    pub fn body_weights(&self) -> &[(NaiveDate, f64)] {
        &self.body_weights
    }

    fn record_from(&self, id: i64, set: &NewSet) -> SetRecord {
        SetRecord {
            id,
            workout_id: set.workout_id,
            exercise_id: set.exercise_id,
            set_number: set.set_number,
            weight: set.weight,
            reps: set.reps,
            feel_rating: set.feel_rating,
            rpe: set.rpe,
            tempo: set.tempo,
            rest_seconds: set.rest_seconds,
            is_dropset: set.is_dropset,
            dropset_parent_id: set.dropset_parent_id,
            notes: set.notes.clone(),
        }
    }
}

impl WorkoutStore for MemoryStore {
    fn current_user(&mut self) -> Result<UserProfile> {
        Ok(UserProfile {
            id: 1,
            name: "Local user".to_string(),
            email: String::new(),
        })
    }

    fn list_exercises(&mut self) -> Result<Vec<Exercise>> {
        Ok(self.exercises.clone())
    }

    fn create_exercise(&mut self, name: &str, muscle_group: &str) -> Result<Exercise> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Exercise name is required".to_string()));
        }
        let duplicate = self
            .exercises
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(name));
        if duplicate {
            return Err(Error::Validation(format!(
                "Exercise '{}' already exists",
                name
            )));
        }

        let exercise = Exercise {
            id: self.next_exercise_id,
            name: name.to_string(),
            muscle_group: muscle_group.trim().to_string(),
        };
        self.next_exercise_id += 1;
        self.exercises.push(exercise.clone());
        Ok(exercise)
    }

    fn create_workout(
        &mut self,
        date: NaiveDate,
        workout_type: WorkoutType,
        notes: &str,
    ) -> Result<Workout> {
        let workout = Workout {
            id: self.next_workout_id,
            date,
            workout_type,
            notes: notes.to_string(),
            started_at: Utc::now(),
            status: SessionStatus::Active,
            ended_at: None,
        };
        self.next_workout_id += 1;
        self.workouts.push(workout.clone());
        Ok(workout)
    }

    fn end_workout(&mut self, workout_id: i64) -> Result<()> {
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.id == workout_id)
            .ok_or_else(|| Error::NotFound(format!("Workout {} not found", workout_id)))?;
        workout.status = SessionStatus::Ended;
        workout.ended_at = Some(Utc::now());
        Ok(())
    }

    fn create_set(&mut self, set: &NewSet) -> Result<SetRecord> {
        if !self.workouts.iter().any(|w| w.id == set.workout_id) {
            return Err(Error::NotFound(format!(
                "Workout {} not found",
                set.workout_id
            )));
        }
        if !self.exercises.iter().any(|e| e.id == set.exercise_id) {
            return Err(Error::NotFound(format!(
                "Exercise {} not found",
                set.exercise_id
            )));
        }

        let record = self.record_from(self.next_set_id, set);
        self.next_set_id += 1;
        self.sets.push(record.clone());
        Ok(record)
    }

    fn update_set(&mut self, set_id: i64, set: &NewSet) -> Result<SetRecord> {
        let index = self
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("Set {} not found", set_id)))?;
        let record = self.record_from(set_id, set);
        self.sets[index] = record.clone();
        Ok(record)
    }

    fn delete_set(&mut self, set_id: i64) -> Result<()> {
        let index = self
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("Set {} not found", set_id)))?;
        self.sets.remove(index);
        Ok(())
    }

    fn record_body_weight(&mut self, date: NaiveDate, weight: f64) -> Result<()> {
        self.body_weights.push((date, weight));
        Ok(())
    }
}
