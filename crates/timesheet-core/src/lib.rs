//! # Timesheet Core Library
//!
//! This library provides the core business logic for the weekly timesheet
//! tracker. Employees time their work per day against department tasks, and
//! submit the week once it is complete. The CLI binary is a thin layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Week Model**: A pure state machine (`Open` -> `Locked`) owning seven
//!   days of timer sessions and notes, with eagerly maintained totals
//! - **Directory**: Reference data mapping employees to departments and
//!   departments to tasks and subtasks
//! - **Storage**: JSON week persistence and TOML-based configuration
//! - **Submission**: Spreadsheet export and optional upload to a central server
//!
//! ## Key Components
//!
//! - [`Week`]: Core week state machine
//! - [`WeekStore`]: Persistence gateway, with [`JsonFileStore`] and [`MemoryStore`]
//! - [`TimesheetService`]: Week commands with persistence and timer policies
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod directory;
pub mod error;
pub mod events;
pub mod service;
pub mod storage;
pub mod submission;
pub mod week;

pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::Directory;
pub use error::{ConfigError, CoreError, DirectoryError, StoreError, SubmitError, WeekError};
pub use events::{DayTotals, Event, RunningTimer};
pub use service::{RemoteOutcome, SubmitReport, TimesheetService};
pub use storage::{
    data_dir, load_or_create, Config, JsonFileStore, MemoryStore, StoredWeek, SubmissionReceipt,
    WeekStore,
};
pub use submission::{CsvExporter, ExportRow, Exporter, RemoteSubmitter};
pub use week::{Day, Session, Submission, Task, TaskRef, Week, WeekKey, WeekState};
