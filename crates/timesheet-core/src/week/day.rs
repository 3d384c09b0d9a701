//! Day aggregator: the sessions and notes of one calendar day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::session::{Session, TaskRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    date: NaiveDate,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    notes: String,
    /// Whole seconds of `total`. Written for readability of the stored
    /// document; rebuilt on load.
    #[serde(default, skip_deserializing)]
    total_secs: i64,
    /// Exact sum of completed session durations.
    #[serde(skip, default = "Duration::zero")]
    total: Duration,
}

impl Day {
    pub(crate) fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: Vec::new(),
            notes: String::new(),
            total_secs: 0,
            total: Duration::zero(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Total of completed sessions. Running sessions are not counted.
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn total_secs(&self) -> i64 {
        self.total_secs
    }

    /// Total including the elapsed part of a running session.
    pub fn live_total(&self, now: DateTime<Utc>) -> Duration {
        self.running()
            .map(|s| s.elapsed_at(now))
            .unwrap_or_else(Duration::zero)
            + self.total()
    }

    pub fn running(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| s.is_running())
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.notes.is_empty()
    }

    /// Number of sessions categorized under `task` (any subtask).
    pub fn sessions_for_task(&self, task: &str) -> usize {
        self.sessions.iter().filter(|s| s.task.task == task).count()
    }

    /// Completed time per task ref, in order of first appearance.
    pub fn totals_by_task(&self) -> Vec<(TaskRef, Duration)> {
        let mut totals: Vec<(TaskRef, Duration)> = Vec::new();
        for session in &self.sessions {
            let Some(duration) = session.duration() else {
                continue;
            };
            match totals.iter_mut().find(|(task, _)| *task == session.task) {
                Some((_, total)) => *total = *total + duration,
                None => totals.push((session.task.clone(), duration)),
            }
        }
        totals
    }

    // ── Mutations (crate-internal; the week enforces the lock) ──────

    pub(crate) fn push(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub(crate) fn running_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.is_running())
    }

    pub(crate) fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    pub(crate) fn recompute(&mut self) {
        self.total = self
            .sessions
            .iter()
            .filter_map(Session::duration)
            .fold(Duration::zero(), |acc, d| acc + d);
        self.total_secs = self.total.num_seconds();
    }

    /// Checks the per-day session invariants of a deserialized day.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let running = self.sessions.iter().filter(|s| s.is_running()).count();
        if running > 1 {
            return Err(format!(
                "{} has {running} running sessions; at most one is allowed",
                self.date
            ));
        }
        if let Some(bad) = self
            .sessions
            .iter()
            .find(|s| s.end.is_some_and(|end| end < s.start))
        {
            return Err(format!("session {} on {} ends before it starts", bad.id, self.date));
        }
        Ok(())
    }
}
