//! Workout summary aggregation.
//!
//! Pure functions over the session's set list; grouping preserves the
//! order in which exercises first appeared so the summary reads like
//! the workout was performed.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::catalog::ExerciseCatalog;
use crate::types::{SetRecord, Workout};

/// Totals for one exercise within a workout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExerciseSummary {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub sets_count: u32,
    pub total_volume: f64,
    pub top_weight: f64,
    pub total_reps: u32,
}

/// Whole-workout totals
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkoutSummary {
    /// Per-exercise breakdown, in first-logged order
    pub exercises: Vec<ExerciseSummary>,
    pub total_sets: u32,
    pub total_volume: f64,
    pub duration_minutes: i64,
}

/// Aggregate a workout's sets into per-exercise and session totals.
///
/// Drop-sets count like any other set. Duration comes from the ended
/// timestamp when the workout is over; for a still-active workout the
/// current time stands in, giving a live preview.
pub fn summarize(
    workout: &Workout,
    sets: &[SetRecord],
    catalog: &ExerciseCatalog,
) -> WorkoutSummary {
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, ExerciseSummary> = HashMap::new();

    for set in sets {
        let entry = groups.entry(set.exercise_id).or_insert_with(|| {
            order.push(set.exercise_id);
            ExerciseSummary {
                exercise_id: set.exercise_id,
                exercise_name: catalog
                    .name_of(set.exercise_id)
                    .unwrap_or("Unknown exercise")
                    .to_string(),
                sets_count: 0,
                total_volume: 0.0,
                top_weight: 0.0,
                total_reps: 0,
            }
        });
        entry.sets_count += 1;
        entry.total_volume += set.volume();
        entry.total_reps += set.reps;
        if set.weight > entry.top_weight {
            entry.top_weight = set.weight;
        }
    }

    let exercises: Vec<ExerciseSummary> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .collect();

    let ended_at = workout.ended_at.unwrap_or_else(Utc::now);
    let duration_minutes = (ended_at - workout.started_at).num_minutes();

    WorkoutSummary {
        exercises,
        total_sets: sets.len() as u32,
        total_volume: sets.iter().map(SetRecord::volume).sum(),
        duration_minutes,
    }
}
