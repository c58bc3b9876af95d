//! HTTP-backed workout store.
//!
//! Talks to the workout API over JSON. Error responses carry a body of
//! the form `{"error": "..."}`; the status code decides which error
//! variant the message lands in, so callers can react to validation
//! failures without string matching.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::{NewSet, WorkoutStore};
use crate::types::{
    Exercise, SessionStatus, SetRecord, Tempo, UserProfile, Workout, WorkoutType,
    DEFAULT_FEEL_RATING,
};

/// Store backed by the remote workout API
pub struct HttpWorkoutStore {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpWorkoutStore {
    /// Create a store for the API rooted at `base_url`
    ///
    /// `token`, when present, is sent as a bearer token on every
    /// request.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let agent = ureq::builder()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .agent
            .request(method, &url)
            .set("Accept", "application/json");
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }
        req
    }
}

/// Shape of the API's error responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

fn map_response(
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, response)) => Err(status_error(code, response)),
        Err(e) => Err(Error::Remote(e.to_string())),
    }
}

fn status_error(code: u16, response: ureq::Response) -> Error {
    let status_text = response.status_text().to_string();
    let message = response
        .into_json::<ErrorBody>()
        .map(|body| body.error)
        .unwrap_or(status_text);
    match code {
        400 | 409 => Error::Validation(message),
        401 | 403 => Error::Unauthorized(message),
        404 => Error::NotFound(message),
        _ => Error::Remote(format!("HTTP {}: {}", code, message)),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json()
        .map_err(|e| Error::Remote(format!("invalid response body: {}", e)))
}

// ============================================================================
// Wire bodies
// ============================================================================
//
// The API emits naive ISO-8601 timestamps (no timezone suffix); they are
// UTC by contract, so parsing goes through NaiveDateTime and is pinned
// to UTC here. Optional fields default rather than fail, so older
// records without e.g. a tempo still load.

#[derive(Debug, Deserialize)]
struct UserBody {
    id: i64,
    name: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserBody> for UserProfile {
    fn from(body: UserBody) -> Self {
        UserProfile {
            id: body.id,
            name: body.name,
            email: body.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExerciseBody {
    id: i64,
    name: String,
    #[serde(default)]
    muscle_group: Option<String>,
}

impl From<ExerciseBody> for Exercise {
    fn from(body: ExerciseBody) -> Self {
        Exercise {
            id: body.id,
            name: body.name,
            muscle_group: body.muscle_group.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkoutBody {
    id: i64,
    date: NaiveDate,
    workout_type: WorkoutType,
    #[serde(default)]
    notes: Option<String>,
    created_at: NaiveDateTime,
    #[serde(default)]
    ended_at: Option<NaiveDateTime>,
}

impl From<WorkoutBody> for Workout {
    fn from(body: WorkoutBody) -> Self {
        let status = if body.ended_at.is_some() {
            SessionStatus::Ended
        } else {
            SessionStatus::Active
        };
        Workout {
            id: body.id,
            date: body.date,
            workout_type: body.workout_type,
            notes: body.notes.unwrap_or_default(),
            started_at: body.created_at.and_utc(),
            status,
            ended_at: body.ended_at.map(|t| t.and_utc()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetBody {
    id: i64,
    workout_id: i64,
    exercise_id: i64,
    set_number: u32,
    weight: f64,
    reps: u32,
    #[serde(default)]
    feel_rating: Option<u8>,
    #[serde(default)]
    rpe: Option<f64>,
    #[serde(default)]
    tempo: Option<Tempo>,
    #[serde(default)]
    rest_time: Option<u32>,
    #[serde(default)]
    is_dropset: bool,
    #[serde(default)]
    dropset_parent_id: Option<i64>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<SetBody> for SetRecord {
    fn from(body: SetBody) -> Self {
        SetRecord {
            id: body.id,
            workout_id: body.workout_id,
            exercise_id: body.exercise_id,
            set_number: body.set_number,
            weight: body.weight,
            reps: body.reps,
            feel_rating: body.feel_rating.unwrap_or(DEFAULT_FEEL_RATING),
            rpe: body.rpe,
            tempo: body.tempo.unwrap_or_default(),
            rest_seconds: body.rest_time.unwrap_or(0),
            is_dropset: body.is_dropset,
            dropset_parent_id: body.dropset_parent_id,
            notes: body.notes.unwrap_or_default(),
        }
    }
}

/// Outbound set payload; the API calls the rest field `rest_time`
fn set_payload(set: &NewSet) -> serde_json::Value {
    serde_json::json!({
        "workout_id": set.workout_id,
        "exercise_id": set.exercise_id,
        "set_number": set.set_number,
        "weight": set.weight,
        "reps": set.reps,
        "feel_rating": set.feel_rating,
        "rpe": set.rpe,
        "tempo": set.tempo,
        "rest_time": set.rest_seconds,
        "is_dropset": set.is_dropset,
        "dropset_parent_id": set.dropset_parent_id,
        "notes": set.notes,
    })
}

impl WorkoutStore for HttpWorkoutStore {
    fn current_user(&mut self) -> Result<UserProfile> {
        let response = map_response(self.request("GET", "/user/me").call())?;
        let body: UserBody = parse_body(response)?;
        Ok(body.into())
    }

    fn list_exercises(&mut self) -> Result<Vec<Exercise>> {
        let response = map_response(self.request("GET", "/exercises").call())?;
        let bodies: Vec<ExerciseBody> = parse_body(response)?;
        Ok(bodies.into_iter().map(Exercise::from).collect())
    }

    fn create_exercise(&mut self, name: &str, muscle_group: &str) -> Result<Exercise> {
        let payload = serde_json::json!({
            "name": name,
            "muscle_group": muscle_group,
        });
        let response = map_response(self.request("POST", "/exercises").send_json(payload))?;
        let body: ExerciseBody = parse_body(response)?;
        Ok(body.into())
    }

    fn create_workout(
        &mut self,
        date: NaiveDate,
        workout_type: WorkoutType,
        notes: &str,
    ) -> Result<Workout> {
        let payload = serde_json::json!({
            "date": date,
            "workout_type": workout_type,
            "notes": notes,
        });
        let response = map_response(self.request("POST", "/workouts/start").send_json(payload))?;
        let body: WorkoutBody = parse_body(response)?;
        let workout = Workout::from(body);
        tracing::debug!("Remote workout {} started", workout.id);
        Ok(workout)
    }

    fn end_workout(&mut self, workout_id: i64) -> Result<()> {
        let path = format!("/workouts/{}/end", workout_id);
        map_response(self.request("PUT", &path).call())?;
        tracing::debug!("Remote workout {} ended", workout_id);
        Ok(())
    }

    fn create_set(&mut self, set: &NewSet) -> Result<SetRecord> {
        let response = map_response(self.request("POST", "/sets").send_json(set_payload(set)))?;
        let body: SetBody = parse_body(response)?;
        Ok(body.into())
    }

    fn update_set(&mut self, set_id: i64, set: &NewSet) -> Result<SetRecord> {
        let path = format!("/sets/{}", set_id);
        let response = map_response(self.request("PUT", &path).send_json(set_payload(set)))?;
        let body: SetBody = parse_body(response)?;
        Ok(body.into())
    }

    fn delete_set(&mut self, set_id: i64) -> Result<()> {
        let path = format!("/sets/{}", set_id);
        map_response(self.request("DELETE", &path).call())?;
        Ok(())
    }

    fn record_body_weight(&mut self, date: NaiveDate, weight: f64) -> Result<()> {
        let payload = serde_json::json!({
            "date": date,
            "weight": weight,
        });
        map_response(self.request("POST", "/bodyweight").send_json(payload))?;
        Ok(())
    }
}
