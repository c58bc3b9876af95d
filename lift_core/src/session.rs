//! Live workout session state machine.
//!
//! A [`Session`] owns everything that exists while a workout is being
//! logged: the open workout, the set records logged so far, the draft
//! being filled in, the input mode, and the shared rest timer.
//!
//! Every mutation is remote-first: the store call happens before any
//! local state changes, so a failed call leaves the session exactly as
//! it was and the user can retry. The set list therefore never holds a
//! record the store did not acknowledge.
//!
//! The input mode is a single tagged value ([`InputMode`]), so "editing
//! set 3" and "next submit is a drop-set of set 3" cannot both be armed
//! at once.

use chrono::Utc;

use crate::catalog::ExerciseCatalog;
use crate::error::{Error, Result};
use crate::store::{MemoryStore, NewSet, WorkoutStore};
use crate::summary::{summarize, WorkoutSummary};
use crate::timer::SharedTimer;
use crate::types::{
    Exercise, InputMode, SessionStatus, SetDraft, SetRecord, Workout, WorkoutType,
};

/// A workout session in progress
pub struct Session<S: WorkoutStore> {
    store: S,
    catalog: ExerciseCatalog,
    workout: Option<Workout>,
    sets: Vec<SetRecord>,
    draft: SetDraft,
    mode: InputMode,
    timer: SharedTimer,
}

impl Session<MemoryStore> {
    /// Session backed by the in-memory store, for logging without a server
    pub fn offline() -> Self {
        Session::new(MemoryStore::new(), ExerciseCatalog::with_seed())
    }
}

impl<S: WorkoutStore> Session<S> {
    pub fn new(store: S, catalog: ExerciseCatalog) -> Self {
        Self {
            store,
            catalog,
            workout: None,
            sets: Vec::new(),
            draft: SetDraft::default(),
            mode: InputMode::Idle,
            timer: SharedTimer::new(),
        }
    }

    pub fn workout(&self) -> Option<&Workout> {
        self.workout.as_ref()
    }

    /// Set records in submission order
    pub fn sets(&self) -> &[SetRecord] {
        &self.sets
    }

    /// Set records newest-first, the order the log is displayed in
    pub fn display_sets(&self) -> impl Iterator<Item = &SetRecord> {
        self.sets.iter().rev()
    }

    pub fn draft(&self) -> &SetDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SetDraft {
        &mut self.draft
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle on the shared rest timer, for wiring up a tick source
    pub fn timer(&self) -> SharedTimer {
        self.timer.clone()
    }

    /// Start a new workout dated today.
    ///
    /// An optional body-weight measurement is recorded first; it is a
    /// standalone fact about the day and is not rolled back if opening
    /// the workout fails afterwards. The rest timer stays stopped at
    /// zero until the first set is submitted.
    pub fn start(
        &mut self,
        workout_type: WorkoutType,
        notes: &str,
        body_weight: Option<f64>,
    ) -> Result<Workout> {
        match &self.workout {
            Some(w) if w.status == SessionStatus::Active => {
                return Err(Error::InvalidState(
                    "A workout is already in progress".to_string(),
                ));
            }
            Some(_) => {
                return Err(Error::InvalidState(
                    "This session has already ended".to_string(),
                ));
            }
            None => {}
        }

        if let Some(weight) = body_weight {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(Error::Validation(
                    "Body weight must be a positive number".to_string(),
                ));
            }
        }

        let date = Utc::now().date_naive();
        if let Some(weight) = body_weight {
            self.store.record_body_weight(date, weight)?;
            tracing::debug!("Body weight {} recorded", weight);
        }

        let workout = self.store.create_workout(date, workout_type, notes)?;
        tracing::info!(
            "Workout {} started ({})",
            workout.id,
            workout.workout_type.label()
        );

        self.workout = Some(workout.clone());
        self.sets.clear();
        self.draft = SetDraft::default();
        self.mode = InputMode::Idle;
        self.timer.stop();
        self.timer.reset();
        Ok(workout)
    }

    /// Submit the current draft.
    ///
    /// In `Idle` or `PendingDropset` mode this appends a new record; in
    /// `Editing` mode it overwrites the referenced record's describable
    /// fields while keeping its identity, set number, rest time and
    /// drop-set linkage.
    ///
    /// A fresh submission reads the rest timer into the record, then
    /// resets and restarts it. Edits leave the timer alone.
    pub fn submit_set(&mut self) -> Result<SetRecord> {
        let workout_id = self.require_active()?;

        // Validation happens before any store call or state change, so
        // a rejected draft stays on screen for correction.
        let exercise_id = self
            .draft
            .exercise_id
            .ok_or_else(|| Error::Validation("An exercise must be selected".to_string()))?;
        if self.catalog.get(exercise_id).is_none() {
            return Err(Error::Validation(format!(
                "Unknown exercise id {}",
                exercise_id
            )));
        }
        let weight = match self.draft.weight {
            Some(w) if w > 0.0 && w.is_finite() => w,
            _ => {
                return Err(Error::Validation(
                    "Weight must be a positive number".to_string(),
                ))
            }
        };
        let reps = match self.draft.reps {
            Some(r) if r > 0 => r,
            _ => return Err(Error::Validation("Reps must be at least 1".to_string())),
        };
        if self.draft.feel_rating > 10 {
            return Err(Error::Validation(
                "Feel rating must be between 0 and 10".to_string(),
            ));
        }
        if let Some(rpe) = self.draft.rpe {
            if !(0.0..=10.0).contains(&rpe) {
                return Err(Error::Validation("RPE must be between 0 and 10".to_string()));
            }
        }

        if let InputMode::Editing(set_id) = self.mode {
            let index = self
                .sets
                .iter()
                .position(|s| s.id == set_id)
                .ok_or_else(|| Error::NotFound(format!("Set {} not found", set_id)))?;
            let existing = &self.sets[index];
            let update = NewSet {
                workout_id,
                exercise_id,
                set_number: existing.set_number,
                weight,
                reps,
                feel_rating: self.draft.feel_rating,
                rpe: self.draft.rpe,
                tempo: self.draft.tempo,
                rest_seconds: existing.rest_seconds,
                is_dropset: existing.is_dropset,
                dropset_parent_id: existing.dropset_parent_id,
                notes: self.draft.notes.clone(),
            };

            let record = self.store.update_set(set_id, &update)?;
            tracing::debug!("Set {} updated", set_id);

            self.sets[index] = record.clone();
            self.draft.clear();
            self.mode = InputMode::Idle;
            return Ok(record);
        }

        let (is_dropset, dropset_parent_id, set_number) = match self.mode {
            InputMode::PendingDropset(parent_id) => {
                let number = self
                    .sets
                    .iter()
                    .find(|s| s.id == parent_id)
                    .map(|p| p.set_number)
                    .unwrap_or_else(|| self.next_set_number(exercise_id));
                (true, Some(parent_id), number)
            }
            _ => (false, None, self.next_set_number(exercise_id)),
        };

        let new_set = NewSet {
            workout_id,
            exercise_id,
            set_number,
            weight,
            reps,
            feel_rating: self.draft.feel_rating,
            rpe: self.draft.rpe,
            tempo: self.draft.tempo,
            rest_seconds: self.timer.elapsed_seconds(),
            is_dropset,
            dropset_parent_id,
            notes: self.draft.notes.clone(),
        };

        let record = self.store.create_set(&new_set)?;
        tracing::debug!(
            "Set {} logged: {}x{} (set #{})",
            record.id,
            record.weight,
            record.reps,
            record.set_number
        );

        self.sets.push(record.clone());
        self.draft.clear();
        self.mode = InputMode::Idle;
        self.timer.reset();
        self.timer.start();
        Ok(record)
    }

    /// Load an existing set into the draft for editing.
    ///
    /// Replaces any pending drop-set mark.
    pub fn begin_edit(&mut self, set_id: i64) -> Result<()> {
        self.require_active()?;
        let record = self
            .sets
            .iter()
            .find(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("Set {} not found", set_id)))?;

        self.draft = SetDraft {
            exercise_id: Some(record.exercise_id),
            weight: Some(record.weight),
            reps: Some(record.reps),
            feel_rating: record.feel_rating,
            rpe: record.rpe,
            tempo: record.tempo,
            notes: record.notes.clone(),
        };
        self.mode = InputMode::Editing(set_id);
        Ok(())
    }

    /// Leave edit mode without submitting; the draft is cleared
    pub fn cancel_edit(&mut self) {
        if let InputMode::Editing(_) = self.mode {
            self.draft.clear();
            self.mode = InputMode::Idle;
        }
    }

    /// Arm the next submission as a drop-set of `parent_id`.
    ///
    /// Drop-sets link one level deep: a drop-set cannot itself be a
    /// parent. Not available while an edit is in progress.
    pub fn mark_dropset(&mut self, parent_id: i64) -> Result<()> {
        self.require_active()?;
        if let InputMode::Editing(_) = self.mode {
            return Err(Error::InvalidState(
                "Finish or cancel the edit first".to_string(),
            ));
        }
        let parent = self
            .sets
            .iter()
            .find(|s| s.id == parent_id)
            .ok_or_else(|| Error::NotFound(format!("Set {} not found", parent_id)))?;
        if parent.is_dropset {
            return Err(Error::Validation(
                "Drop-sets can only be linked one level deep".to_string(),
            ));
        }

        self.mode = InputMode::PendingDropset(parent_id);
        Ok(())
    }

    /// Disarm a pending drop-set mark; the draft is left as typed
    pub fn cancel_dropset(&mut self) {
        if let InputMode::PendingDropset(_) = self.mode {
            self.mode = InputMode::Idle;
        }
    }

    /// Delete a set from the workout.
    ///
    /// Numbers of other sets are not recomputed. If the input mode
    /// referenced the removed set it falls back to idle. A removed
    /// drop-set parent leaves its children in place with a dangling
    /// link, which the summary tolerates.
    pub fn remove_set(&mut self, set_id: i64) -> Result<SetRecord> {
        self.require_active()?;
        let index = self
            .sets
            .iter()
            .position(|s| s.id == set_id)
            .ok_or_else(|| Error::NotFound(format!("Set {} not found", set_id)))?;

        self.store.delete_set(set_id)?;
        let record = self.sets.remove(index);
        tracing::debug!("Set {} removed", set_id);

        match self.mode {
            InputMode::Editing(id) if id == set_id => {
                self.draft.clear();
                self.mode = InputMode::Idle;
            }
            InputMode::PendingDropset(id) if id == set_id => {
                self.mode = InputMode::Idle;
            }
            _ => {}
        }
        Ok(record)
    }

    /// End the workout.
    ///
    /// The store is told first; only once it acknowledges does the
    /// session stop the timer and stamp `ended_at`. A failed call
    /// leaves the workout active so ending can be retried.
    pub fn end(&mut self) -> Result<Workout> {
        match self.workout.as_mut() {
            Some(workout) if workout.status == SessionStatus::Active => {
                self.store.end_workout(workout.id)?;
                self.timer.stop();
                workout.status = SessionStatus::Ended;
                workout.ended_at = Some(Utc::now());
                tracing::info!("Workout {} ended", workout.id);
                Ok(workout.clone())
            }
            Some(_) => Err(Error::InvalidState(
                "This session has already ended".to_string(),
            )),
            None => Err(Error::InvalidState("No active workout".to_string())),
        }
    }

    /// Add an exercise to the catalog and select it in the draft
    pub fn add_exercise(&mut self, name: &str, muscle_group: &str) -> Result<Exercise> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Exercise name is required".to_string()));
        }

        let exercise = self.store.create_exercise(name, muscle_group)?;
        tracing::info!("Exercise '{}' added (id {})", exercise.name, exercise.id);

        self.catalog.add(exercise.clone());
        self.draft.exercise_id = Some(exercise.id);
        Ok(exercise)
    }

    /// Summary of the session so far.
    ///
    /// Valid once a workout exists; before it ends the duration is a
    /// live preview, afterwards it is fixed by the ended timestamp.
    pub fn summary(&self) -> Result<WorkoutSummary> {
        let workout = self
            .workout
            .as_ref()
            .ok_or_else(|| Error::InvalidState("No active workout".to_string()))?;
        Ok(summarize(workout, &self.sets, &self.catalog))
    }

    fn require_active(&self) -> Result<i64> {
        match &self.workout {
            Some(w) if w.status == SessionStatus::Active => Ok(w.id),
            Some(_) => Err(Error::InvalidState(
                "This session has already ended".to_string(),
            )),
            None => Err(Error::InvalidState("No active workout".to_string())),
        }
    }

    fn next_set_number(&self, exercise_id: i64) -> u32 {
        let count = self
            .sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id && !s.is_dropset)
            .count() as u32;
        count + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tempo, UserProfile};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const SQUAT: i64 = 1;
    const BENCH: i64 = 2;

    fn started() -> Session<MemoryStore> {
        crate::logging::init_test();
        let mut session = Session::offline();
        session.start(WorkoutType::Legs, "", None).unwrap();
        session
    }

    fn fill<S: WorkoutStore>(session: &mut Session<S>, exercise_id: i64, weight: f64, reps: u32) {
        let draft = session.draft_mut();
        draft.exercise_id = Some(exercise_id);
        draft.weight = Some(weight);
        draft.reps = Some(reps);
    }

    // Store wrapper whose operations can be made to fail on demand,
    // standing in for a flaky network.
    #[derive(Clone, Default)]
    struct FailFlags {
        create_workout: Arc<AtomicBool>,
        end_workout: Arc<AtomicBool>,
        create_set: Arc<AtomicBool>,
        update_set: Arc<AtomicBool>,
        delete_set: Arc<AtomicBool>,
    }

    impl FailFlags {
        fn set(flag: &AtomicBool, value: bool) {
            flag.store(value, Ordering::SeqCst);
        }
    }

    struct FlakyStore {
        inner: MemoryStore,
        fail: FailFlags,
    }

    impl FlakyStore {
        fn new() -> (Self, FailFlags) {
            let flags = FailFlags::default();
            (
                Self {
                    inner: MemoryStore::new(),
                    fail: flags.clone(),
                },
                flags,
            )
        }

        fn gate(flag: &AtomicBool) -> Result<()> {
            if flag.load(Ordering::SeqCst) {
                Err(Error::Remote("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl WorkoutStore for FlakyStore {
        fn current_user(&mut self) -> Result<UserProfile> {
            self.inner.current_user()
        }

        fn list_exercises(&mut self) -> Result<Vec<Exercise>> {
            self.inner.list_exercises()
        }

        fn create_exercise(&mut self, name: &str, muscle_group: &str) -> Result<Exercise> {
            self.inner.create_exercise(name, muscle_group)
        }

        fn create_workout(
            &mut self,
            date: NaiveDate,
            workout_type: WorkoutType,
            notes: &str,
        ) -> Result<Workout> {
            Self::gate(&self.fail.create_workout)?;
            self.inner.create_workout(date, workout_type, notes)
        }

        fn end_workout(&mut self, workout_id: i64) -> Result<()> {
            Self::gate(&self.fail.end_workout)?;
            self.inner.end_workout(workout_id)
        }

        fn create_set(&mut self, set: &NewSet) -> Result<SetRecord> {
            Self::gate(&self.fail.create_set)?;
            self.inner.create_set(set)
        }

        fn update_set(&mut self, set_id: i64, set: &NewSet) -> Result<SetRecord> {
            Self::gate(&self.fail.update_set)?;
            self.inner.update_set(set_id, set)
        }

        fn delete_set(&mut self, set_id: i64) -> Result<()> {
            Self::gate(&self.fail.delete_set)?;
            self.inner.delete_set(set_id)
        }

        fn record_body_weight(&mut self, date: NaiveDate, weight: f64) -> Result<()> {
            self.inner.record_body_weight(date, weight)
        }
    }

    #[test]
    fn test_first_set_gets_number_one() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        assert_eq!(record.set_number, 1);
        assert!(!record.is_dropset);
        assert!(record.dropset_parent_id.is_none());
        assert_eq!(session.sets().len(), 1);
    }

    #[test]
    fn test_set_numbers_run_per_exercise() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let squat1 = session.submit_set().unwrap();
        fill(&mut session, BENCH, 95.0, 8);
        let bench1 = session.submit_set().unwrap();
        fill(&mut session, SQUAT, 145.0, 3);
        let squat2 = session.submit_set().unwrap();

        assert_eq!(squat1.set_number, 1);
        assert_eq!(bench1.set_number, 1);
        assert_eq!(squat2.set_number, 2);
    }

    #[test]
    fn test_dropset_links_to_parent_and_reuses_its_number() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();

        session.mark_dropset(parent.id).unwrap();
        assert_eq!(session.mode(), InputMode::PendingDropset(parent.id));

        fill(&mut session, SQUAT, 95.0, 8);
        let dropset = session.submit_set().unwrap();

        assert!(dropset.is_dropset);
        assert_eq!(dropset.dropset_parent_id, Some(parent.id));
        assert_eq!(dropset.set_number, parent.set_number);
        assert_eq!(session.sets()[0].set_number, 1, "parent number unaffected");
        assert_eq!(session.mode(), InputMode::Idle, "mark consumed by submit");

        // The drop-set does not advance the per-exercise count.
        fill(&mut session, SQUAT, 145.0, 3);
        let third = session.submit_set().unwrap();
        assert_eq!(third.set_number, 2);
        assert!(!third.is_dropset);
    }

    #[test]
    fn test_dropset_of_dropset_is_rejected() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();
        session.mark_dropset(parent.id).unwrap();
        fill(&mut session, SQUAT, 95.0, 8);
        let child = session.submit_set().unwrap();

        let err = session.mark_dropset(child.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        assert_eq!(session.mode(), InputMode::Idle);
    }

    #[test]
    fn test_mark_dropset_requires_existing_parent() {
        let mut session = started();
        let err = session.mark_dropset(42).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[test]
    fn test_cancel_dropset_returns_to_plain_submission() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();

        session.mark_dropset(parent.id).unwrap();
        fill(&mut session, SQUAT, 95.0, 8);
        session.cancel_dropset();
        assert_eq!(session.mode(), InputMode::Idle);
        assert_eq!(
            session.draft().weight,
            Some(95.0),
            "cancel must not clear the draft"
        );

        let record = session.submit_set().unwrap();
        assert!(!record.is_dropset);
        assert_eq!(record.set_number, 2);
    }

    #[test]
    fn test_submit_reads_timer_then_resets_and_restarts() {
        let mut session = started();
        let timer = session.timer();
        assert!(!timer.is_running(), "timer idle until the first set");

        fill(&mut session, SQUAT, 135.0, 5);
        let first = session.submit_set().unwrap();
        assert_eq!(first.rest_seconds, 0);
        assert!(timer.is_running(), "first submit starts the rest timer");

        for _ in 0..90 {
            timer.tick();
        }
        fill(&mut session, SQUAT, 145.0, 3);
        let second = session.submit_set().unwrap();
        assert_eq!(second.rest_seconds, 90);
        assert_eq!(timer.elapsed_seconds(), 0, "submit resets the timer");
        assert!(timer.is_running());
    }

    #[test]
    fn test_edit_preserves_identity_number_rest_and_timer() {
        let mut session = started();
        let timer = session.timer();

        fill(&mut session, SQUAT, 135.0, 5);
        let first = session.submit_set().unwrap();
        for _ in 0..60 {
            timer.tick();
        }
        fill(&mut session, SQUAT, 145.0, 3);
        session.submit_set().unwrap();

        for _ in 0..30 {
            timer.tick();
        }
        session.begin_edit(first.id).unwrap();
        let draft = session.draft_mut();
        draft.weight = Some(155.0);
        draft.reps = Some(4);
        let updated = session.submit_set().unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.set_number, first.set_number);
        assert_eq!(updated.rest_seconds, first.rest_seconds);
        assert_eq!(updated.weight, 155.0);
        assert_eq!(updated.reps, 4);
        assert_eq!(session.sets().len(), 2, "edit must not append");
        assert_eq!(session.sets()[0].weight, 155.0, "record replaced in place");
        assert_eq!(session.mode(), InputMode::Idle);

        assert_eq!(timer.elapsed_seconds(), 30, "edits leave the timer alone");
        assert!(timer.is_running());
    }

    #[test]
    fn test_begin_edit_loads_the_record_into_the_draft() {
        let mut session = started();
        {
            let draft = session.draft_mut();
            draft.exercise_id = Some(BENCH);
            draft.weight = Some(95.0);
            draft.reps = Some(8);
            draft.feel_rating = 9;
            draft.rpe = Some(8.0);
            draft.tempo = Tempo::Pause;
            draft.notes = "close grip".to_string();
        }
        let record = session.submit_set().unwrap();

        session.begin_edit(record.id).unwrap();
        let draft = session.draft();
        assert_eq!(draft.exercise_id, Some(BENCH));
        assert_eq!(draft.weight, Some(95.0));
        assert_eq!(draft.reps, Some(8));
        assert_eq!(draft.feel_rating, 9);
        assert_eq!(draft.rpe, Some(8.0));
        assert_eq!(draft.tempo, Tempo::Pause);
        assert_eq!(draft.notes, "close grip");
    }

    #[test]
    fn test_edit_keeps_dropset_linkage() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();
        session.mark_dropset(parent.id).unwrap();
        fill(&mut session, SQUAT, 95.0, 8);
        let child = session.submit_set().unwrap();

        session.begin_edit(child.id).unwrap();
        session.draft_mut().weight = Some(85.0);
        let updated = session.submit_set().unwrap();

        assert!(updated.is_dropset);
        assert_eq!(updated.dropset_parent_id, Some(parent.id));
        assert_eq!(updated.weight, 85.0);
    }

    #[test]
    fn test_begin_edit_unknown_set_is_not_found() {
        let mut session = started();
        let err = session.begin_edit(99).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[test]
    fn test_cancel_edit_clears_draft_and_mode() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        session.begin_edit(record.id).unwrap();
        session.cancel_edit();
        assert_eq!(session.mode(), InputMode::Idle);
        assert!(session.draft().weight.is_none());
        assert_eq!(
            session.draft().exercise_id,
            Some(SQUAT),
            "selected exercise survives the clear"
        );
    }

    #[test]
    fn test_mark_dropset_while_editing_is_rejected() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        session.begin_edit(record.id).unwrap();
        let err = session.mark_dropset(record.id).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)), "got {:?}", err);
        assert_eq!(session.mode(), InputMode::Editing(record.id));
    }

    #[test]
    fn test_begin_edit_replaces_pending_dropset() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        session.mark_dropset(record.id).unwrap();
        session.begin_edit(record.id).unwrap();
        assert_eq!(session.mode(), InputMode::Editing(record.id));

        session.draft_mut().reps = Some(6);
        let updated = session.submit_set().unwrap();
        assert!(!updated.is_dropset, "edit, not a drop-set submission");
        assert_eq!(session.sets().len(), 1);
    }

    #[test]
    fn test_validation_failure_leaves_everything_untouched() {
        let mut session = started();
        fill(&mut session, SQUAT, -5.0, 5);

        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        assert!(session.sets().is_empty());
        assert_eq!(session.draft().weight, Some(-5.0), "draft kept for fixing");
        assert_eq!(session.mode(), InputMode::Idle);
        assert!(!session.timer().is_running());
        assert!(session.store().sets().is_empty());
    }

    #[test]
    fn test_draft_field_validation() {
        let mut session = started();

        session.draft_mut().weight = Some(135.0);
        session.draft_mut().reps = Some(5);
        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "missing exercise: {:?}", err);

        fill(&mut session, SQUAT, 135.0, 0);
        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "zero reps: {:?}", err);

        fill(&mut session, SQUAT, 135.0, 5);
        session.draft_mut().feel_rating = 11;
        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "feel 11: {:?}", err);

        session.draft_mut().feel_rating = 7;
        session.draft_mut().rpe = Some(10.5);
        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "rpe 10.5: {:?}", err);

        session.draft_mut().rpe = Some(9.5);
        assert!(session.submit_set().is_ok());
    }

    #[test]
    fn test_remove_set_keeps_numbers_and_store_in_step() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let first = session.submit_set().unwrap();
        fill(&mut session, SQUAT, 145.0, 3);
        let second = session.submit_set().unwrap();

        let removed = session.remove_set(first.id).unwrap();
        assert_eq!(removed.id, first.id);
        assert_eq!(session.sets().len(), 1);
        assert_eq!(session.sets()[0].id, second.id);
        assert_eq!(
            session.sets()[0].set_number,
            2,
            "numbers are not recomputed on removal"
        );
        assert_eq!(session.store().sets().len(), 1);

        // Numbering is count-based, so the freed slot is reused.
        fill(&mut session, SQUAT, 135.0, 5);
        let third = session.submit_set().unwrap();
        assert_eq!(third.set_number, 2);
    }

    #[test]
    fn test_remove_unknown_set_leaves_list_unchanged() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        session.submit_set().unwrap();

        let err = session.remove_set(99).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
        assert_eq!(session.sets().len(), 1);
    }

    #[test]
    fn test_remove_clears_mode_referencing_the_set() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let first = session.submit_set().unwrap();
        fill(&mut session, SQUAT, 145.0, 3);
        let second = session.submit_set().unwrap();

        session.mark_dropset(first.id).unwrap();
        session.remove_set(first.id).unwrap();
        assert_eq!(session.mode(), InputMode::Idle);

        session.begin_edit(second.id).unwrap();
        session.remove_set(second.id).unwrap();
        assert_eq!(session.mode(), InputMode::Idle);
        assert!(session.draft().weight.is_none(), "edit draft discarded");
    }

    #[test]
    fn test_removing_parent_leaves_child_counted() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();
        session.mark_dropset(parent.id).unwrap();
        fill(&mut session, SQUAT, 95.0, 8);
        let child = session.submit_set().unwrap();

        session.remove_set(parent.id).unwrap();
        assert_eq!(session.sets().len(), 1);
        assert_eq!(session.sets()[0].id, child.id);
        assert_eq!(session.sets()[0].dropset_parent_id, Some(parent.id));

        let summary = session.summary().unwrap();
        assert_eq!(summary.total_sets, 1);
        assert_eq!(summary.total_volume, 760.0);
    }

    #[test]
    fn test_summary_matches_logged_sets() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        session.submit_set().unwrap();
        fill(&mut session, SQUAT, 145.0, 3);
        session.submit_set().unwrap();
        fill(&mut session, BENCH, 95.0, 8);
        session.submit_set().unwrap();
        session.end().unwrap();

        let summary = session.summary().unwrap();
        assert_eq!(summary.total_sets, 3);
        assert_eq!(summary.total_volume, 1870.0);

        let squat = &summary.exercises[0];
        assert_eq!(squat.exercise_name, "Squat");
        assert_eq!(squat.sets_count, 2);
        assert_eq!(squat.total_volume, 1110.0);
        assert_eq!(squat.top_weight, 145.0);
        assert_eq!(squat.total_reps, 8);

        let bench = &summary.exercises[1];
        assert_eq!(bench.sets_count, 1);
        assert_eq!(bench.total_volume, 760.0);
    }

    #[test]
    fn test_lifecycle_guards() {
        let mut session = Session::offline();
        assert!(matches!(
            session.submit_set().unwrap_err(),
            Error::InvalidState(_)
        ));
        assert!(matches!(
            session.begin_edit(1).unwrap_err(),
            Error::InvalidState(_)
        ));
        assert!(matches!(
            session.mark_dropset(1).unwrap_err(),
            Error::InvalidState(_)
        ));
        assert!(matches!(
            session.remove_set(1).unwrap_err(),
            Error::InvalidState(_)
        ));
        assert!(matches!(session.end().unwrap_err(), Error::InvalidState(_)));
        assert!(matches!(
            session.summary().unwrap_err(),
            Error::InvalidState(_)
        ));

        session.start(WorkoutType::Legs, "", None).unwrap();
        let err = session.start(WorkoutType::Chest, "", None).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)), "got {:?}", err);

        session.end().unwrap();
        assert!(matches!(session.end().unwrap_err(), Error::InvalidState(_)));
        fill(&mut session, SQUAT, 135.0, 5);
        assert!(matches!(
            session.submit_set().unwrap_err(),
            Error::InvalidState(_)
        ));
        assert!(matches!(
            session.start(WorkoutType::Legs, "", None).unwrap_err(),
            Error::InvalidState(_)
        ));
    }

    #[test]
    fn test_end_stops_timer_and_snapshots_duration() {
        let mut session = started();

        fill(&mut session, SQUAT, 135.0, 5);
        session.submit_set().unwrap();
        let timer = session.timer();
        assert!(timer.is_running());

        let workout = session.end().unwrap();
        assert_eq!(workout.status, SessionStatus::Ended);
        assert!(workout.ended_at.is_some());
        assert!(!timer.is_running(), "ending stops the rest timer");

        let summary = session.summary().unwrap();
        assert_eq!(summary.duration_minutes, 0);
    }

    #[test]
    fn test_failed_create_leaves_session_unchanged() {
        let (store, flags) = FlakyStore::new();
        let mut session = Session::new(store, ExerciseCatalog::with_seed());
        session.start(WorkoutType::Legs, "", None).unwrap();

        fill(&mut session, SQUAT, 135.0, 5);
        let parent = session.submit_set().unwrap();
        session.mark_dropset(parent.id).unwrap();
        fill(&mut session, SQUAT, 95.0, 8);

        FailFlags::set(&flags.create_set, true);
        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Remote(_)), "got {:?}", err);

        assert_eq!(session.sets().len(), 1, "nothing appended locally");
        assert_eq!(session.draft().weight, Some(95.0), "draft kept for retry");
        assert_eq!(
            session.mode(),
            InputMode::PendingDropset(parent.id),
            "drop-set mark still armed"
        );
        assert_eq!(session.store().inner.sets().len(), 1);

        // Retry goes through once the store recovers.
        FailFlags::set(&flags.create_set, false);
        let record = session.submit_set().unwrap();
        assert!(record.is_dropset);
        assert_eq!(session.sets().len(), 2);
    }

    #[test]
    fn test_failed_update_keeps_old_record_and_edit_mode() {
        let (store, flags) = FlakyStore::new();
        let mut session = Session::new(store, ExerciseCatalog::with_seed());
        session.start(WorkoutType::Legs, "", None).unwrap();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        session.begin_edit(record.id).unwrap();
        session.draft_mut().weight = Some(155.0);
        FailFlags::set(&flags.update_set, true);

        let err = session.submit_set().unwrap_err();
        assert!(matches!(err, Error::Remote(_)), "got {:?}", err);
        assert_eq!(session.sets()[0].weight, 135.0, "record unchanged");
        assert_eq!(session.mode(), InputMode::Editing(record.id));
        assert_eq!(session.draft().weight, Some(155.0));
    }

    #[test]
    fn test_failed_delete_keeps_record() {
        let (store, flags) = FlakyStore::new();
        let mut session = Session::new(store, ExerciseCatalog::with_seed());
        session.start(WorkoutType::Legs, "", None).unwrap();
        fill(&mut session, SQUAT, 135.0, 5);
        let record = session.submit_set().unwrap();

        FailFlags::set(&flags.delete_set, true);
        let err = session.remove_set(record.id).unwrap_err();
        assert!(matches!(err, Error::Remote(_)), "got {:?}", err);
        assert_eq!(session.sets().len(), 1);
        assert_eq!(session.store().inner.sets().len(), 1);
    }

    #[test]
    fn test_failed_end_keeps_workout_active() {
        let (store, flags) = FlakyStore::new();
        let mut session = Session::new(store, ExerciseCatalog::with_seed());
        session.start(WorkoutType::Legs, "", None).unwrap();
        fill(&mut session, SQUAT, 135.0, 5);
        session.submit_set().unwrap();
        let timer = session.timer();

        FailFlags::set(&flags.end_workout, true);
        let err = session.end().unwrap_err();
        assert!(matches!(err, Error::Remote(_)), "got {:?}", err);
        assert_eq!(session.workout().unwrap().status, SessionStatus::Active);
        assert!(session.workout().unwrap().ended_at.is_none());
        assert!(timer.is_running(), "timer untouched on failed end");

        FailFlags::set(&flags.end_workout, false);
        let workout = session.end().unwrap();
        assert_eq!(workout.status, SessionStatus::Ended);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_body_weight_is_recorded_before_the_workout_opens() {
        let (store, flags) = FlakyStore::new();
        let mut session = Session::new(store, ExerciseCatalog::with_seed());

        FailFlags::set(&flags.create_workout, true);
        let err = session
            .start(WorkoutType::Legs, "", Some(181.5))
            .unwrap_err();
        assert!(matches!(err, Error::Remote(_)), "got {:?}", err);
        assert!(session.workout().is_none());
        // The measurement is a standalone fact and stays recorded.
        assert_eq!(session.store().inner.body_weights().len(), 1);

        FailFlags::set(&flags.create_workout, false);
        session.start(WorkoutType::Legs, "", Some(181.5)).unwrap();
        assert!(session.workout().is_some());
        assert_eq!(session.store().inner.body_weights().len(), 2);
    }

    #[test]
    fn test_invalid_body_weight_fails_before_any_store_call() {
        let mut session = Session::offline();
        let err = session
            .start(WorkoutType::Legs, "", Some(-10.0))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        assert!(session.workout().is_none());
        assert!(session.store().body_weights().is_empty());
    }

    #[test]
    fn test_add_exercise_updates_catalog_and_selects_it() {
        let mut session = started();
        let exercise = session.add_exercise("Hack Squat", "Legs").unwrap();

        assert_eq!(exercise.id, 8);
        assert!(session.catalog().get(exercise.id).is_some());
        assert_eq!(session.draft().exercise_id, Some(exercise.id));

        fill(&mut session, exercise.id, 90.0, 10);
        let record = session.submit_set().unwrap();
        assert_eq!(record.exercise_id, exercise.id);
    }

    #[test]
    fn test_add_exercise_validation() {
        let mut session = started();
        let err = session.add_exercise("   ", "Legs").unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);

        let err = session.add_exercise("Squat", "Legs").unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "duplicate: {:?}", err);
    }

    #[test]
    fn test_display_sets_are_newest_first() {
        let mut session = started();
        fill(&mut session, SQUAT, 135.0, 5);
        session.submit_set().unwrap();
        fill(&mut session, BENCH, 95.0, 8);
        session.submit_set().unwrap();

        let ids: Vec<i64> = session.display_sets().map(|s| s.id).collect();
        assert_eq!(ids, [2, 1]);
    }
}
