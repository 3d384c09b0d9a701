//! Core error types for timesheet-core.
//!
//! This module defines the error hierarchy using thiserror. Every error is
//! local to the single requested operation: the week model is never left
//! half-mutated when one of these is returned.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timesheet-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Week model rule violations
    #[error(transparent)]
    Week(#[from] WeekError),

    /// Persistence gateway errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Submission gateway errors
    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reference data errors
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Employee is not part of the directory
    #[error("Unknown employee: {0}")]
    UnknownEmployee(String),

    /// Timers may only run on the current calendar day
    #[error("Timer can only be started for today ({today}), not {date}")]
    NotToday { date: NaiveDate, today: NaiveDate },
}

/// Week model errors.
///
/// These are the user-visible rejections of the week state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeekError {
    /// The week was submitted and is read-only
    #[error("Week is locked: it has been submitted and can no longer be changed")]
    LockedWeek,

    /// A timer is already running on the day
    #[error("A session is already running on {day}")]
    SessionAlreadyRunning { day: Weekday },

    /// Stop requested but nothing is running
    #[error("No running session on {day}")]
    NoRunningSession { day: Weekday },

    /// Submit blocked by a running timer
    #[error("Cannot submit while a session is running on {day}; stop it first")]
    RunningSession { day: Weekday },

    /// Task still categorizes recorded sessions
    #[error("Task '{task}' is used by {sessions} session(s) and cannot be deleted")]
    TaskInUse { task: String, sessions: usize },

    /// Task (or task/subtask pair) is not active in this week
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Task name already active in this week
    #[error("Task '{0}' already exists in this week")]
    DuplicateTask(String),

    /// Task belongs to a different department than the week
    #[error("Task department '{task_department}' does not match week department '{week_department}'")]
    DepartmentMismatch {
        week_department: String,
        task_department: String,
    },

    /// Stop time earlier than start time
    #[error("Invalid interval: end ({end}) is before start ({start})")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Persistence gateway errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record for the employee/week
    #[error("No timesheet stored for {0}")]
    NotFound(String),

    /// Failed to read or write the document
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON
    #[error("Failed to parse timesheet document: {0}")]
    Json(#[from] serde_json::Error),

    /// A single record violates week invariants
    #[error("Corrupt record '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Submission gateway errors.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Remote endpoint answered with a non-success status
    #[error("Remote submission rejected (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Transport-level failure talking to the remote endpoint
    #[error("Remote submission failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Spreadsheet encoding failed
    #[error("Spreadsheet export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Export file could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
}

/// Reference data errors.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read directory file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse directory: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
