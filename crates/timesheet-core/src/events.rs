use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::week::{TaskRef, WeekState};

/// Every state change of a week produces an Event.
/// The CLI prints them; callers may log or forward them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A new empty week was created for an employee.
    WeekCreated {
        employee: String,
        department: String,
        week_start: NaiveDate,
        at: DateTime<Utc>,
    },
    SessionStarted {
        day: Weekday,
        session_id: Uuid,
        task: TaskRef,
        at: DateTime<Utc>,
    },
    SessionStopped {
        day: Weekday,
        session_id: Uuid,
        task: TaskRef,
        duration_secs: i64,
        day_total_secs: i64,
        week_total_secs: i64,
        at: DateTime<Utc>,
    },
    NoteEdited {
        day: Weekday,
        at: DateTime<Utc>,
    },
    TaskAdded {
        task: String,
        subtasks: Vec<String>,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task: String,
        at: DateTime<Utc>,
    },
    /// Week transitioned to Locked; totals are frozen from here on.
    WeekSubmitted {
        employee: String,
        week_start: NaiveDate,
        weekly_total_secs: i64,
        at: DateTime<Utc>,
    },
    WeekSnapshot {
        employee: String,
        department: String,
        week_start: NaiveDate,
        state: WeekState,
        days: Vec<DayTotals>,
        weekly_total_secs: i64,
        weekly_total_hhmm: String,
        /// Includes the elapsed part of a running session.
        live_weekly_total_secs: i64,
        running: Option<RunningTimer>,
        at: DateTime<Utc>,
    },
}

/// Per-day line of a week snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotals {
    pub day: Weekday,
    pub date: NaiveDate,
    pub sessions: usize,
    pub total_secs: i64,
    pub live_total_secs: i64,
    pub total_hhmm: String,
    pub notes: String,
}

/// The session currently being timed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningTimer {
    pub day: Weekday,
    pub session_id: Uuid,
    pub task: TaskRef,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: i64,
}
