//! Local CSV logbook.
//!
//! Finished workouts are appended to a CSV file, one row per set, so a
//! lifting history survives on disk even when the remote API holds the
//! canonical copy. Appends take an exclusive file lock, so two loggers
//! finishing at the same time cannot interleave rows.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::catalog::ExerciseCatalog;
use crate::error::Result;
use crate::types::{SetRecord, Workout};

/// One set as written to the logbook
#[derive(Debug, Serialize, Deserialize)]
struct LogbookRow {
    workout_id: i64,
    date: NaiveDate,
    workout_type: String,
    set_id: i64,
    exercise: String,
    set_number: u32,
    weight: f64,
    reps: u32,
    feel_rating: u8,
    rpe: Option<f64>,
    tempo: String,
    rest_seconds: u32,
    is_dropset: bool,
    notes: String,
}

impl LogbookRow {
    fn from_parts(workout: &Workout, set: &SetRecord, catalog: &ExerciseCatalog) -> Self {
        Self {
            workout_id: workout.id,
            date: workout.date,
            workout_type: workout.workout_type.label().to_string(),
            set_id: set.id,
            exercise: catalog
                .name_of(set.exercise_id)
                .unwrap_or("Unknown exercise")
                .to_string(),
            set_number: set.set_number,
            weight: set.weight,
            reps: set.reps,
            feel_rating: set.feel_rating,
            rpe: set.rpe,
            tempo: set.tempo.label().to_string(),
            rest_seconds: set.rest_seconds,
            is_dropset: set.is_dropset,
            notes: set.notes.clone(),
        }
    }
}

/// One workout as read back from the logbook
#[derive(Clone, Debug, PartialEq)]
pub struct LogbookSession {
    pub workout_id: i64,
    pub date: NaiveDate,
    pub workout_type: String,
    pub sets: u32,
    pub total_volume: f64,
}

/// Append a finished workout's sets to the logbook
///
/// Creates the file (with headers) on first use. A workout with no sets
/// writes nothing. Returns the number of rows written.
pub fn append_session(
    path: &Path,
    workout: &Workout,
    sets: &[SetRecord],
    catalog: &ExerciseCatalog,
) -> Result<usize> {
    if sets.is_empty() {
        tracing::info!("Workout {} had no sets, nothing to log", workout.id);
        return Ok(0);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    // Headers only when the file is empty; checked after locking so a
    // concurrent first writer cannot race us into double headers.
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for set in sets {
        writer.serialize(LogbookRow::from_parts(workout, set, catalog))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;
    file.unlock()?;

    tracing::info!("Wrote {} sets to logbook {:?}", sets.len(), path);
    Ok(sets.len())
}

/// Read the logbook back as per-workout summaries, newest first
///
/// Malformed rows are skipped with a warning rather than failing the
/// whole read. A missing file is an empty history.
pub fn read_sessions(path: &Path) -> Result<Vec<LogbookSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut reader = csv::ReaderBuilder::new().from_reader(&file);
    let mut rows: Vec<LogbookRow> = Vec::new();
    for (line_num, result) in reader.deserialize::<LogbookRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Skipping malformed logbook row {}: {}", line_num + 1, e);
            }
        }
    }
    drop(reader);
    file.unlock()?;

    let mut sessions: Vec<LogbookSession> = Vec::new();
    // Offline sessions restart workout ids at 1, so the date joins the
    // grouping key.
    let mut index: HashMap<(i64, NaiveDate), usize> = HashMap::new();
    for row in rows {
        let i = *index.entry((row.workout_id, row.date)).or_insert_with(|| {
            sessions.push(LogbookSession {
                workout_id: row.workout_id,
                date: row.date,
                workout_type: row.workout_type.clone(),
                sets: 0,
                total_volume: 0.0,
            });
            sessions.len() - 1
        });
        sessions[i].sets += 1;
        sessions[i].total_volume += row.weight * f64::from(row.reps);
    }

    sessions.sort_by(|a, b| b.date.cmp(&a.date).then(b.workout_id.cmp(&a.workout_id)));
    tracing::debug!("Read {} workouts from logbook", sessions.len());
    Ok(sessions)
}
