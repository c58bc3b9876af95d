//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required input missing or out of range; the draft is left intact
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted in the wrong session state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Referenced set or exercise does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store rejected our credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The persistence collaborator failed; the operation did not happen
    #[error("Remote error: {0}")]
    Remote(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
