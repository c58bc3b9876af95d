#![forbid(unsafe_code)]

//! Core domain model and business logic for LiftLog.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, set records, drafts)
//! - Exercise catalog management
//! - The live session state machine with its rest timer
//! - Storage backends (remote API, in-memory)
//! - Summary aggregation and the local CSV logbook

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod timer;
pub mod store;
pub mod remote;
pub mod session;
pub mod summary;
pub mod logbook;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{seed_exercises, ExerciseCatalog};
pub use config::Config;
pub use logbook::{append_session, read_sessions, LogbookSession};
pub use remote::HttpWorkoutStore;
pub use session::Session;
pub use store::{MemoryStore, NewSet, WorkoutStore};
pub use summary::{summarize, ExerciseSummary, WorkoutSummary};
pub use timer::{format_elapsed, RestTimer, SharedTimer, Ticker};
