//! Exercise catalog with the built-in seed list.
//!
//! The catalog is append-only: exercises are seeded or added, never mutated
//! or removed. User additions get their identity from the store first.

use crate::types::Exercise;
use once_cell::sync::Lazy;

/// Cached seed list - built once and reused across all catalogs
static SEED_EXERCISES: Lazy<Vec<Exercise>> = Lazy::new(build_seed_exercises);

/// Get a reference to the built-in exercise list
pub fn seed_exercises() -> &'static [Exercise] {
    &SEED_EXERCISES
}

fn build_seed_exercises() -> Vec<Exercise> {
    fn exercise(id: i64, name: &str, muscle_group: &str) -> Exercise {
        Exercise {
            id,
            name: name.into(),
            muscle_group: muscle_group.into(),
        }
    }

    vec![
        exercise(1, "Squat", "Legs"),
        exercise(2, "Bench Press", "Chest"),
        exercise(3, "Deadlift", "Back"),
        exercise(4, "Overhead Press", "Shoulders"),
        exercise(5, "Barbell Row", "Back"),
        exercise(6, "Pull-ups", "Back"),
        exercise(7, "Dips", "Chest"),
    ]
}

/// In-memory exercise catalog: the seed list plus user additions
#[derive(Clone, Debug, Default)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
}

impl ExerciseCatalog {
    /// Catalog holding only the built-in exercises
    pub fn with_seed() -> Self {
        Self {
            exercises: seed_exercises().to_vec(),
        }
    }

    /// Catalog hydrated from an external listing (e.g. the remote store)
    pub fn from_exercises(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }

    /// Append an exercise that already has its identity assigned
    pub fn add(&mut self, exercise: Exercise) {
        self.exercises.push(exercise);
    }

    /// Look up an exercise by id
    pub fn get(&self, id: i64) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Resolve an exercise id to its display name
    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }

    /// Case-insensitive lookup by name
    pub fn find_by_name(&self, name: &str) -> Option<&Exercise> {
        let wanted = name.trim().to_lowercase();
        self.exercises
            .iter()
            .find(|e| e.name.to_lowercase() == wanted)
    }

    /// Iterate over the catalog in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter()
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.exercises.is_empty() {
            errors.push("Catalog has no exercises".to_string());
        }

        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise {} has empty name", exercise.id));
            }
            let duplicates = self
                .exercises
                .iter()
                .filter(|e| e.id == exercise.id)
                .count();
            if duplicates > 1 {
                errors.push(format!("Duplicate exercise id {}", exercise.id));
            }
        }

        errors.sort();
        errors.dedup();
        errors
    }
}
