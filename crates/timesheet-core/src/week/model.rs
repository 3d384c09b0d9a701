//! Week model: the authoritative in-memory timesheet of one employee's week.
//!
//! The week is a two-state machine. It performs no I/O; callers persist it
//! after each successful command.
//!
//! ## State Transitions
//!
//! ```text
//! Open -- submit() --> Locked   (terminal)
//! ```
//!
//! Every command validates first and mutates last, so a rejected command
//! leaves the week exactly as it was. Day and week totals are recomputed
//! eagerly after each mutation; queries never see a stale value.
//!
//! ## Usage
//!
//! ```ignore
//! let mut week = Week::new("Jayant Rai", "Technical", today);
//! week.add_task("Meeting", "Technical", vec!["Meeting".into()])?;
//! week.start_session(Weekday::Mon, TaskRef::new("Meeting"))?;
//! week.stop_session(Weekday::Mon)?;
//! let submission = week.submit()?;
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::day::Day;
use super::session::{Session, TaskRef};
use super::task::Task;
use super::{format_hhmm, monday_of};
use crate::error::WeekError;
use crate::events::{DayTotals, Event, RunningTimer};

pub const DAYS_PER_WEEK: usize = 7;

const KEY_SEPARATOR: &str = "::";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekState {
    Open,
    /// Submitted. No session, day or task may change any more.
    Locked,
}

impl Default for WeekState {
    fn default() -> Self {
        WeekState::Open
    }
}

/// Identity of a stored week: employee plus the Monday the week starts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub employee: String,
    pub week_start: NaiveDate,
}

impl WeekKey {
    /// Builds the key of the week containing `date`.
    pub fn new(employee: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee: employee.into(),
            week_start: monday_of(date),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.employee, self.week_start)
    }
}

impl FromStr for WeekKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (employee, date) = s
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| format!("week key '{s}' is missing '{KEY_SEPARATOR}'"))?;
        let week_start = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("week key '{s}' has an invalid date: {e}"))?;
        if employee.is_empty() {
            return Err(format!("week key '{s}' has an empty employee"));
        }
        if week_start.weekday() != Weekday::Mon {
            return Err(format!("week key '{s}' does not start on a Monday"));
        }
        Ok(Self {
            employee: employee.to_string(),
            week_start,
        })
    }
}

/// A locked week handed to the submission gateway.
#[derive(Debug, Clone)]
pub struct Submission {
    pub week: Week,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn event(&self) -> Event {
        Event::WeekSubmitted {
            employee: self.week.employee().to_string(),
            week_start: self.week.week_start(),
            weekly_total_secs: self.week.total_for_week().num_seconds(),
            at: self.submitted_at,
        }
    }
}

/// Core week model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeekRecord")]
pub struct Week {
    employee: String,
    department: String,
    week_start: NaiveDate,
    /// Monday..Sunday.
    days: Vec<Day>,
    tasks: Vec<Task>,
    state: WeekState,
    submitted_at: Option<DateTime<Utc>>,
    /// Whole seconds of `weekly_total`. Rebuilt on load.
    weekly_total_secs: i64,
    #[serde(skip)]
    weekly_total: Duration,
}

impl Week {
    /// Create an empty, open week containing `date`.
    ///
    /// The week always starts on the Monday of `date`.
    pub fn new(
        employee: impl Into<String>,
        department: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let week_start = monday_of(date);
        let days = week_start
            .iter_days()
            .take(DAYS_PER_WEEK)
            .map(Day::new)
            .collect();
        Self {
            employee: employee.into(),
            department: department.into(),
            week_start,
            days,
            tasks: Vec::new(),
            state: WeekState::Open,
            submitted_at: None,
            weekly_total_secs: 0,
            weekly_total: Duration::zero(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn key(&self) -> WeekKey {
        WeekKey {
            employee: self.employee.clone(),
            week_start: self.week_start,
        }
    }

    pub fn employee(&self) -> &str {
        &self.employee
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn state(&self) -> WeekState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == WeekState::Locked
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn day(&self, day: Weekday) -> &Day {
        &self.days[day.num_days_from_monday() as usize]
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn date_of(&self, day: Weekday) -> NaiveDate {
        self.day(day).date()
    }

    /// The weekday `date` falls on, if it is inside this week.
    pub fn weekday_of(&self, date: NaiveDate) -> Option<Weekday> {
        self.days.iter().find(|d| d.date() == date).map(Day::weekday)
    }

    pub fn total_for_day(&self, day: Weekday) -> Duration {
        self.day(day).total()
    }

    pub fn total_for_week(&self) -> Duration {
        self.weekly_total
    }

    pub fn live_total_for_day(&self, day: Weekday, now: DateTime<Utc>) -> Duration {
        self.day(day).live_total(now)
    }

    pub fn live_total_for_week(&self, now: DateTime<Utc>) -> Duration {
        self.days
            .iter()
            .fold(Duration::zero(), |acc, d| acc + d.live_total(now))
    }

    /// The running session, if any, with its day.
    pub fn running_session(&self) -> Option<(Weekday, &Session)> {
        self.days
            .iter()
            .find_map(|d| d.running().map(|s| (d.weekday(), s)))
    }

    /// Checks that `task` is an active task of the week (and subtask of it).
    pub fn validate_task_ref(&self, task: &TaskRef) -> Result<(), WeekError> {
        if self.tasks.iter().any(|t| t.accepts(task)) {
            Ok(())
        } else {
            Err(WeekError::UnknownTask(task.to_string()))
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        let days = self
            .days
            .iter()
            .map(|d| DayTotals {
                day: d.weekday(),
                date: d.date(),
                sessions: d.sessions().len(),
                total_secs: d.total_secs(),
                live_total_secs: d.live_total(now).num_seconds(),
                total_hhmm: format_hhmm(d.total()),
                notes: d.notes().to_string(),
            })
            .collect();
        let running = self.running_session().map(|(day, s)| RunningTimer {
            day,
            session_id: s.id,
            task: s.task.clone(),
            started_at: s.start,
            elapsed_secs: s.elapsed_at(now).num_seconds(),
        });
        Event::WeekSnapshot {
            employee: self.employee.clone(),
            department: self.department.clone(),
            week_start: self.week_start,
            state: self.state,
            days,
            weekly_total_secs: self.weekly_total_secs,
            weekly_total_hhmm: format_hhmm(self.total_for_week()),
            live_weekly_total_secs: self.live_total_for_week(now).num_seconds(),
            running,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_session(&mut self, day: Weekday, task: TaskRef) -> Result<Event, WeekError> {
        self.start_session_at(day, task, Utc::now())
    }

    pub fn start_session_at(
        &mut self,
        day: Weekday,
        task: TaskRef,
        at: DateTime<Utc>,
    ) -> Result<Event, WeekError> {
        self.ensure_open()?;
        if self.day(day).running().is_some() {
            return Err(WeekError::SessionAlreadyRunning { day });
        }
        self.validate_task_ref(&task)?;

        let session = Session::begin(task.clone(), at);
        let session_id = session.id;
        self.day_mut(day).push(session);
        debug!(employee = %self.employee, week_start = %self.week_start, %day, %task, "session started");
        Ok(Event::SessionStarted {
            day,
            session_id,
            task,
            at,
        })
    }

    pub fn stop_session(&mut self, day: Weekday) -> Result<Event, WeekError> {
        self.stop_session_at(day, Utc::now())
    }

    pub fn stop_session_at(&mut self, day: Weekday, at: DateTime<Utc>) -> Result<Event, WeekError> {
        self.ensure_open()?;
        let running = self
            .day(day)
            .running()
            .ok_or(WeekError::NoRunningSession { day })?;
        if at < running.start {
            return Err(WeekError::InvalidInterval {
                start: running.start,
                end: at,
            });
        }

        let target = self.day_mut(day);
        let Some(session) = target.running_mut() else {
            return Err(WeekError::NoRunningSession { day });
        };
        session.finish(at);
        let (session_id, task, duration) = (
            session.id,
            session.task.clone(),
            session.duration().unwrap_or_else(Duration::zero),
        );
        target.recompute();
        self.recompute_week();

        debug!(
            employee = %self.employee,
            %day,
            duration_secs = duration.num_seconds(),
            week_total_secs = self.weekly_total_secs,
            "session stopped"
        );
        Ok(Event::SessionStopped {
            day,
            session_id,
            task,
            duration_secs: duration.num_seconds(),
            day_total_secs: self.day(day).total_secs(),
            week_total_secs: self.weekly_total_secs,
            at,
        })
    }

    pub fn edit_note(&mut self, day: Weekday, text: impl Into<String>) -> Result<Event, WeekError> {
        self.ensure_open()?;
        self.day_mut(day).set_notes(text.into());
        debug!(employee = %self.employee, %day, "note edited");
        Ok(Event::NoteEdited { day, at: Utc::now() })
    }

    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        department: impl Into<String>,
        subtasks: Vec<String>,
    ) -> Result<Event, WeekError> {
        self.ensure_open()?;
        let task = Task::new(name, department, subtasks);
        if task.department != self.department {
            return Err(WeekError::DepartmentMismatch {
                week_department: self.department.clone(),
                task_department: task.department,
            });
        }
        if self.task(&task.name).is_some() {
            return Err(WeekError::DuplicateTask(task.name));
        }

        let event = Event::TaskAdded {
            task: task.name.clone(),
            subtasks: task.subtasks.clone(),
            at: Utc::now(),
        };
        debug!(employee = %self.employee, task = %task.name, "task added");
        self.tasks.push(task);
        Ok(event)
    }

    /// Remove a task. Tasks still categorizing sessions cannot be removed.
    pub fn delete_task(&mut self, name: &str) -> Result<Event, WeekError> {
        self.ensure_open()?;
        let index = self
            .tasks
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| WeekError::UnknownTask(name.to_string()))?;
        let sessions: usize = self.days.iter().map(|d| d.sessions_for_task(name)).sum();
        if sessions > 0 {
            return Err(WeekError::TaskInUse {
                task: name.to_string(),
                sessions,
            });
        }

        let task = self.tasks.remove(index);
        debug!(employee = %self.employee, task = %task.name, "task deleted");
        Ok(Event::TaskDeleted {
            task: task.name,
            at: Utc::now(),
        })
    }

    pub fn submit(&mut self) -> Result<Submission, WeekError> {
        self.submit_at(Utc::now())
    }

    /// Lock the week. Requires every timer to be stopped.
    pub fn submit_at(&mut self, at: DateTime<Utc>) -> Result<Submission, WeekError> {
        self.ensure_open()?;
        if let Some((day, _)) = self.running_session() {
            return Err(WeekError::RunningSession { day });
        }

        self.recompute_week();
        self.state = WeekState::Locked;
        self.submitted_at = Some(at);
        debug!(
            employee = %self.employee,
            week_start = %self.week_start,
            weekly_total_secs = self.weekly_total_secs,
            "week locked"
        );
        Ok(Submission {
            week: self.clone(),
            submitted_at: at,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), WeekError> {
        match self.state {
            WeekState::Open => Ok(()),
            WeekState::Locked => Err(WeekError::LockedWeek),
        }
    }

    fn day_mut(&mut self, day: Weekday) -> &mut Day {
        &mut self.days[day.num_days_from_monday() as usize]
    }

    fn recompute_week(&mut self) {
        self.weekly_total = self
            .days
            .iter()
            .fold(Duration::zero(), |acc, d| acc + d.total());
        self.weekly_total_secs = self.weekly_total.num_seconds();
    }
}

/// Stored shape of a week. Derived totals are not read back.
#[derive(Deserialize)]
struct WeekRecord {
    employee: String,
    department: String,
    week_start: NaiveDate,
    days: Vec<Day>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    state: WeekState,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

impl TryFrom<WeekRecord> for Week {
    type Error = String;

    fn try_from(record: WeekRecord) -> Result<Self, Self::Error> {
        if record.week_start.weekday() != Weekday::Mon {
            return Err(format!("week_start {} is not a Monday", record.week_start));
        }
        if record.days.len() != DAYS_PER_WEEK {
            return Err(format!(
                "expected {DAYS_PER_WEEK} days, found {}",
                record.days.len()
            ));
        }
        for (expected, day) in record.week_start.iter_days().zip(&record.days) {
            if day.date() != expected {
                return Err(format!("day {} is out of order (expected {expected})", day.date()));
            }
            day.validate()?;
        }
        for (i, task) in record.tasks.iter().enumerate() {
            if record.tasks[..i].iter().any(|t| t.name == task.name) {
                return Err(format!("task '{}' is listed twice", task.name));
            }
        }
        let orphan = record
            .days
            .iter()
            .flat_map(Day::sessions)
            .find(|s| !record.tasks.iter().any(|t| t.accepts(&s.task)));
        if let Some(orphan) = orphan {
            return Err(format!("session {} references unknown task '{}'", orphan.id, orphan.task));
        }
        let running = record.days.iter().any(|d| d.running().is_some());
        if record.state == WeekState::Locked && running {
            return Err("locked week has a running session".to_string());
        }

        let mut week = Week {
            employee: record.employee,
            department: record.department,
            week_start: record.week_start,
            days: record.days,
            tasks: record.tasks,
            state: record.state,
            submitted_at: record.submitted_at,
            weekly_total_secs: 0,
            weekly_total: Duration::zero(),
        };
        week.days.iter_mut().for_each(Day::recompute);
        week.recompute_week();
        Ok(week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
    }

    fn week_with_meeting() -> Week {
        let mut week = Week::new("Jayant Rai", "Technical", monday());
        week.add_task("Meeting", "Technical", vec!["Meeting".into()])
            .unwrap();
        week
    }

    #[test]
    fn new_week_normalises_to_monday() {
        let week = Week::new("A", "Sales", NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(week.week_start(), monday());
        assert_eq!(week.days().len(), DAYS_PER_WEEK);
        assert_eq!(week.date_of(Weekday::Sun), NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(week.state(), WeekState::Open);
    }

    #[test]
    fn start_stop_updates_totals() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 9, 0))
            .unwrap();
        let event = week.stop_session_at(Weekday::Mon, at(1, 10, 30)).unwrap();
        match event {
            Event::SessionStopped {
                duration_secs,
                week_total_secs,
                ..
            } => {
                assert_eq!(duration_secs, 90 * 60);
                assert_eq!(week_total_secs, 90 * 60);
            }
            other => panic!("Expected SessionStopped, got {other:?}"),
        }
        assert_eq!(week.total_for_day(Weekday::Mon), Duration::minutes(90));
    }

    #[test]
    fn start_rejects_unknown_subtask() {
        let mut week = week_with_meeting();
        let err = week
            .start_session_at(
                Weekday::Mon,
                TaskRef::with_subtask("Meeting", "Lunch"),
                at(1, 9, 0),
            )
            .unwrap_err();
        assert!(matches!(err, WeekError::UnknownTask(_)));
        assert!(week.day(Weekday::Mon).sessions().is_empty());
    }

    #[test]
    fn stop_before_start_is_rejected_without_change() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 9, 0))
            .unwrap();
        let before = week.clone();
        let err = week.stop_session_at(Weekday::Mon, at(1, 8, 0)).unwrap_err();
        assert!(matches!(err, WeekError::InvalidInterval { .. }));
        assert_eq!(week, before);
    }

    #[test]
    fn add_task_rejects_other_department_and_duplicates() {
        let mut week = week_with_meeting();
        assert!(matches!(
            week.add_task("Leads", "Sales", vec![]),
            Err(WeekError::DepartmentMismatch { .. })
        ));
        assert!(matches!(
            week.add_task("Meeting", "Technical", vec![]),
            Err(WeekError::DuplicateTask(_))
        ));
        assert_eq!(week.tasks().len(), 1);
    }

    #[test]
    fn delete_task_blocked_while_in_use() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Tue, TaskRef::new("Meeting"), at(2, 9, 0))
            .unwrap();
        week.stop_session_at(Weekday::Tue, at(2, 9, 45)).unwrap();
        assert_eq!(
            week.delete_task("Meeting").unwrap_err(),
            WeekError::TaskInUse {
                task: "Meeting".into(),
                sessions: 1
            }
        );
        assert!(matches!(
            week.delete_task("Adhoc"),
            Err(WeekError::UnknownTask(_))
        ));
    }

    #[test]
    fn delete_unused_task() {
        let mut week = week_with_meeting();
        week.delete_task("Meeting").unwrap();
        assert!(week.tasks().is_empty());
    }

    #[test]
    fn snapshot_reports_running_timer() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Wed, TaskRef::new("Meeting"), at(3, 9, 0))
            .unwrap();
        match week.snapshot(at(3, 9, 20)) {
            Event::WeekSnapshot {
                running,
                weekly_total_secs,
                live_weekly_total_secs,
                ..
            } => {
                let running = running.expect("running timer");
                assert_eq!(running.day, Weekday::Wed);
                assert_eq!(running.elapsed_secs, 20 * 60);
                assert_eq!(weekly_total_secs, 0);
                assert_eq!(live_weekly_total_secs, 20 * 60);
            }
            other => panic!("Expected WeekSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn week_key_roundtrips_through_display() {
        let key = WeekKey::new("Ritu Das", NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(key.to_string(), "Ritu Das::2024-01-01");
        assert_eq!("Ritu Das::2024-01-01".parse::<WeekKey>().unwrap(), key);
        assert!("no-separator".parse::<WeekKey>().is_err());
        assert!("::2024-01-01".parse::<WeekKey>().is_err());
    }

    #[test]
    fn week_key_rejects_non_monday_start() {
        let err = "Ritu Das::2024-01-03".parse::<WeekKey>().unwrap_err();
        assert!(err.contains("Monday"));
    }

    #[test]
    fn totals_keep_subsecond_durations() {
        let mut week = week_with_meeting();
        let mut exact = Duration::zero();
        for minute in [0, 10, 20] {
            let start = at(1, 9, minute) + Duration::milliseconds(300);
            let end = start + Duration::milliseconds(1600);
            week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), start)
                .unwrap();
            week.stop_session_at(Weekday::Mon, end).unwrap();
            exact = exact + (end - start);
        }
        assert_eq!(week.total_for_day(Weekday::Mon), exact);
        assert_eq!(week.total_for_week(), Duration::milliseconds(4800));

        let json = serde_json::to_value(&week).unwrap();
        assert_eq!(json["weekly_total_secs"], 4);
        let loaded: Week = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.total_for_week(), exact);
    }

    #[test]
    fn deserialize_recomputes_totals() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 9, 0))
            .unwrap();
        week.stop_session_at(Weekday::Mon, at(1, 11, 0)).unwrap();

        let mut json = serde_json::to_value(&week).unwrap();
        json["weekly_total_secs"] = serde_json::json!(999_999);
        json["days"][0]["total_secs"] = serde_json::json!(1);

        let loaded: Week = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.total_for_week(), Duration::hours(2));
        assert_eq!(loaded.total_for_day(Weekday::Mon), Duration::hours(2));
    }

    #[test]
    fn deserialize_rejects_orphan_session() {
        let mut week = week_with_meeting();
        week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 9, 0))
            .unwrap();
        let mut json = serde_json::to_value(&week).unwrap();
        json["tasks"] = serde_json::json!([]);
        let err = serde_json::from_value::<Week>(json).unwrap_err();
        assert!(err.to_string().contains("unknown task"));
    }
}
