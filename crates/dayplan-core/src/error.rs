//! Core error types for dayplan-core.
//!
//! This module defines the error hierarchy using thiserror. Generation
//! failures (`ScheduleError`) are kept separate from storage and
//! configuration failures so callers can surface them to users unmodified.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schedule generation failed
    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single generation call. No partial plan accompanies any variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// At least one task has no free span before its effective deadline.
    #[error("Not all tasks could be scheduled within the planning horizon or available time slots.")]
    Infeasible { task_id: String, task_name: String },

    /// Two event occurrences inside the horizon overlap each other.
    #[error("Events '{first}' and '{second}' overlap at {at}.")]
    EventConflict {
        first: String,
        second: String,
        at: chrono::DateTime<chrono::Utc>,
    },

    /// A configured work cap was hit before any placement was attempted.
    #[error("Scheduling complexity too high: {what} is {actual}, limit is {limit}.")]
    ComplexityLimitExceeded {
        what: &'static str,
        actual: u64,
        limit: u64,
    },

    /// An input record breaks an invariant the placer relies on.
    #[error("Invalid schedule input: {0}")]
    PreconditionViolated(#[from] ValidationError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The schedule id does not exist
    #[error("Schedule with ID {0} not found.")]
    ScheduleNotFound(String),

    /// An event or task id does not belong to the schedule
    #[error("{kind} with ID '{id}' not found or not associated with schedule '{schedule}'.")]
    NotFound {
        kind: &'static str,
        id: String,
        schedule: String,
    },
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

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Home directory could not be resolved
    #[error("Could not determine a data directory")]
    NoDataDir,
}

/// Validation errors for event and task records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event name must not be empty.")]
    EmptyEventName,

    #[error("Task name must not be empty.")]
    EmptyTaskName,

    #[error("Event start time must be before end time.")]
    EventTimeRange,

    #[error("Weekly repeat events must specify at least one day of the week (0=Sunday, 6=Saturday).")]
    WeeklyWithoutDays,

    #[error("Day of week must be between 0 (Sunday) and 6 (Saturday), got {0}.")]
    InvalidWeekday(u8),

    #[error("Expected completion time must be positive.")]
    NonPositiveEffort,

    #[error("Priority must be between 0 and 100.")]
    PriorityOutOfRange,

    #[error("Completion level must be between 0 and 100.")]
    CompletionOutOfRange,

    #[error("Work window start and end must differ.")]
    EmptyWorkWindow,

    #[error("Planning horizon must be at least one day.")]
    EmptyHorizon,

    #[error("Unknown repeat rule '{0}', expected none, daily, weekly:<days>, monthly or yearly.")]
    UnknownRepeat(String),

    #[error("Invalid time of day '{0}', expected HH:MM.")]
    InvalidTimeOfDay(String),

    #[error("Failed to expand recurrence for event '{event}': {message}")]
    InvalidRecurrence { event: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
