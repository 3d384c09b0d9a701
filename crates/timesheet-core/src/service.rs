//! Application service: week commands with persistence and timer policy.
//!
//! The caller owns the `Week`; every command validates, mutates it in
//! place and then saves it. A failed save leaves the in-memory week as it
//! is and reports the error.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::directory::Directory;
use crate::error::{CoreError, Result, WeekError};
use crate::events::Event;
use crate::storage::{load_or_create, Config, SubmissionReceipt, WeekStore};
use crate::submission::{self, CsvExporter, ExportRow, Exporter, RemoteSubmitter};
use crate::week::{TaskRef, Week, WeekKey};

/// What happened to the remote upload of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// `remote.enabled` is off.
    Disabled,
    /// Nothing to send.
    Skipped,
    Accepted,
    Failed(String),
}

/// Result of submitting a week. The week is locked whatever the gateways did.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub event: Event,
    pub rows: usize,
    pub export_file: Option<PathBuf>,
    pub export_error: Option<String>,
    pub remote: RemoteOutcome,
    pub receipt_error: Option<String>,
}

pub struct TimesheetService<S, C = SystemClock> {
    store: S,
    directory: Directory,
    config: Config,
    clock: C,
}

impl<S: WeekStore, C: Clock> TimesheetService<S, C> {
    pub fn new(store: S, directory: Directory, config: Config, clock: C) -> Self {
        Self {
            store,
            directory,
            config,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The week of `employee` containing `date`, created and saved if new.
    pub fn open_week(&self, employee: &str, date: NaiveDate) -> Result<(Week, Option<Event>)> {
        load_or_create(&self.store, &self.directory, employee, date)
    }

    /// The week of `employee` containing today.
    pub fn current_week(&self, employee: &str) -> Result<(Week, Option<Event>)> {
        self.open_week(employee, self.clock.today())
    }

    /// Stored weeks of `employee`, oldest first.
    pub fn weeks_of(&self, employee: &str) -> Result<Vec<WeekKey>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.employee == employee)
            .collect())
    }

    /// Catalogue tasks of the week's department.
    pub fn catalog(&self, week: &Week) -> Vec<&str> {
        self.directory.tasks_for(week.department())
    }

    pub fn snapshot(&self, week: &Week) -> Event {
        week.snapshot(self.clock.now())
    }

    /// Start timing `task` on `day`.
    ///
    /// With `timer.restrict_to_today` only today's day can be started. With
    /// `timer.single_running` a timer running on another day of the week is
    /// stopped first; its stop event comes before the start event.
    pub fn start_timer(&self, week: &mut Week, day: Weekday, task: TaskRef) -> Result<Vec<Event>> {
        if week.is_locked() {
            return Err(WeekError::LockedWeek.into());
        }
        if self.config.timer.restrict_to_today {
            let today = self.clock.today();
            let date = week.date_of(day);
            if date != today {
                return Err(CoreError::NotToday { date, today });
            }
        }
        week.validate_task_ref(&task)?;
        if week.day(day).running().is_some() {
            return Err(WeekError::SessionAlreadyRunning { day }.into());
        }

        let now = self.clock.now();
        let mut events = Vec::with_capacity(2);
        if self.config.timer.single_running {
            if let Some((other, _)) = week.running_session() {
                events.push(week.stop_session_at(other, now)?);
            }
        }
        events.push(week.start_session_at(day, task, now)?);
        self.store.save(week)?;
        Ok(events)
    }

    pub fn stop_timer(&self, week: &mut Week, day: Weekday) -> Result<Event> {
        let event = week.stop_session_at(day, self.clock.now())?;
        self.store.save(week)?;
        Ok(event)
    }

    /// Stop whichever day has a running timer.
    pub fn stop_running(&self, week: &mut Week) -> Result<Event> {
        let day = week
            .running_session()
            .map(|(day, _)| day)
            .unwrap_or_else(|| self.clock.today().weekday());
        self.stop_timer(week, day)
    }

    pub fn edit_note(&self, week: &mut Week, day: Weekday, text: &str) -> Result<Event> {
        let event = week.edit_note(day, text)?;
        self.store.save(week)?;
        Ok(event)
    }

    /// Activate a catalogue task of the week's department, with its subtasks.
    pub fn add_task(&self, week: &mut Week, name: &str) -> Result<Event> {
        if week.is_locked() {
            return Err(WeekError::LockedWeek.into());
        }
        let task = self
            .directory
            .task_for(week.department(), name)
            .ok_or_else(|| WeekError::UnknownTask(name.to_string()))?;
        let event = week.add_task(task.name, task.department, task.subtasks)?;
        self.store.save(week)?;
        Ok(event)
    }

    pub fn delete_task(&self, week: &mut Week, name: &str) -> Result<Event> {
        let event = week.delete_task(name)?;
        self.store.save(week)?;
        Ok(event)
    }

    /// Lock and save the week, then export it and upload it.
    ///
    /// Once the lock is saved, export, upload and receipt failures end up
    /// in the report and the week stays locked. An empty week is locked
    /// without exporting or uploading.
    pub async fn submit(&self, week: &mut Week) -> Result<SubmitReport> {
        let submission = week.submit_at(self.clock.now())?;
        self.store.save(week)?;
        info!(
            employee = %week.employee(),
            week_start = %week.week_start(),
            weekly_total_secs = week.total_for_week().num_seconds(),
            "week submitted"
        );

        let rows = submission::rows(&submission.week);
        let mut receipt = SubmissionReceipt {
            submitted_at: Some(submission.submitted_at),
            ..Default::default()
        };
        let mut report = SubmitReport {
            event: submission.event(),
            rows: rows.len(),
            export_file: None,
            export_error: None,
            remote: RemoteOutcome::Skipped,
            receipt_error: None,
        };

        if rows.is_empty() {
            info!(employee = %week.employee(), "nothing booked; export skipped");
        } else {
            match self.write_export(&submission.week, &rows) {
                Ok((path, digest)) => {
                    info!(path = %path.display(), "export written");
                    receipt.export_file = Some(path.display().to_string());
                    receipt.export_sha256 = Some(digest);
                    report.export_file = Some(path);
                }
                Err(err) => {
                    warn!(error = %err, "export failed");
                    report.export_error = Some(err.to_string());
                }
            }
            report.remote = self.upload(&rows).await;
            receipt.server_upload = match report.remote {
                RemoteOutcome::Accepted => Some(true),
                RemoteOutcome::Failed(_) => Some(false),
                RemoteOutcome::Disabled | RemoteOutcome::Skipped => None,
            };
        }

        if let Err(err) = self.store.save_receipt(&week.key(), receipt) {
            warn!(error = %err, "receipt not saved");
            report.receipt_error = Some(err.to_string());
        }
        Ok(report)
    }

    /// Writes the export file; returns its path and hex SHA-256.
    fn write_export(&self, week: &Week, rows: &[ExportRow]) -> Result<(PathBuf, String)> {
        let exporter = CsvExporter;
        let bytes = exporter.encode(rows)?;
        let dir = self.config.export_dir()?;
        let name = submission::export_file_name(week, exporter.extension());
        let path = submission::write_export(&dir, &name, &bytes)?;
        Ok((path, hex::encode(Sha256::digest(&bytes))))
    }

    async fn upload(&self, rows: &[ExportRow]) -> RemoteOutcome {
        let submitter = match RemoteSubmitter::from_config(&self.config) {
            Ok(Some(submitter)) => submitter,
            Ok(None) => return RemoteOutcome::Disabled,
            Err(err) => {
                warn!(error = %err, "remote submitter misconfigured");
                return RemoteOutcome::Failed(err.to_string());
            }
        };
        match submitter.submit(rows).await {
            Ok(()) => RemoteOutcome::Accepted,
            Err(err) => {
                warn!(url = %submitter.url(), error = %err, "remote submission failed");
                RemoteOutcome::Failed(err.to_string())
            }
        }
    }
}
