//! Timer sessions: one contiguous start/stop interval within a day.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The task/subtask pair a session is categorized under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskRef {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask: Option<String>,
}

impl TaskRef {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            subtask: None,
        }
    }

    pub fn with_subtask(task: impl Into<String>, subtask: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            subtask: Some(subtask.into()),
        }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtask {
            Some(sub) => write!(f, "{} / {}", self.task, sub),
            None => f.write_str(&self.task),
        }
    }
}

/// A single timer interval.
///
/// `end == None` means the timer is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub task: TaskRef,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl Session {
    pub(crate) fn begin(task: TaskRef, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            start: at,
            end: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }

    /// Duration of a completed session; `None` while running.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    /// Elapsed time as of `now`. Running sessions count up to `now`.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        match self.end {
            Some(end) => end - self.start,
            None => (now - self.start).max(Duration::zero()),
        }
    }

    pub(crate) fn finish(&mut self, at: DateTime<Utc>) {
        self.end = Some(at);
    }
}
