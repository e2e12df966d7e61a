//! Core error types for questplan-core.
//!
//! Every failure the engine reports is a caller contract violation; running
//! out of time for a task is an outcome, not an error.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for questplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Input validation errors, raised before any allocation work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Effort must be a positive number of minutes
    #[error("Task '{task}' has non-positive effort: {effort} minutes")]
    NonPositiveEffort { task: String, effort: i64 },

    /// At least one candidate schedule must be requested
    #[error("Number of schedules must be at least 1, got {0}")]
    InvalidScheduleCount(usize),

    /// Probability outside [0, 1]
    #[error("Skip probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    /// Timestamp string that no supported format accepts
    #[error("Unable to parse timestamp: {0}")]
    UnparseableTimestamp(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not name a configuration field
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
