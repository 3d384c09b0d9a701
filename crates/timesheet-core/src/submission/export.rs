//! Spreadsheet export of a submitted week.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SubmitError;
use crate::week::{decimal_hours, Week};

const HEADERS: [&str; 8] = [
    "Employee",
    "Department",
    "Week Start",
    "Day",
    "Task",
    "Subtask",
    "Hours",
    "Notes",
];

/// One spreadsheet line: the time booked on one task on one day.
///
/// Also the JSON shape posted to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Employee")]
    pub employee: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Week Start")]
    pub week_start: NaiveDate,
    #[serde(rename = "Day")]
    pub day: NaiveDate,
    /// Empty for a notes-only line.
    #[serde(rename = "Task")]
    pub task: String,
    #[serde(rename = "Subtask")]
    pub subtask: Option<String>,
    #[serde(rename = "Hours")]
    pub hours: f64,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Flattens a week into export rows, Monday first.
///
/// Each day yields one row per task ref with completed time, carrying the
/// day's notes. A day with notes but no time yields a single row with an
/// empty task. Days with neither are left out.
pub fn rows(week: &Week) -> Vec<ExportRow> {
    let row = |day: NaiveDate, task: String, subtask: Option<String>, hours: f64, notes: &str| {
        ExportRow {
            employee: week.employee().to_string(),
            department: week.department().to_string(),
            week_start: week.week_start(),
            day,
            task,
            subtask,
            hours,
            notes: notes.to_string(),
        }
    };

    let mut out = Vec::new();
    for day in week.days() {
        let booked: Vec<_> = day
            .totals_by_task()
            .into_iter()
            .filter(|(_, total)| total.num_seconds() > 0)
            .collect();
        if booked.is_empty() {
            if !day.notes().is_empty() {
                out.push(row(day.date(), String::new(), None, 0.0, day.notes()));
            }
            continue;
        }
        for (task, total) in booked {
            out.push(row(
                day.date(),
                task.task,
                task.subtask,
                decimal_hours(total),
                day.notes(),
            ));
        }
    }
    out
}

/// `Submission_<Employee_Name>_<week_start>.<ext>`
pub fn export_file_name(week: &Week, extension: &str) -> String {
    format!(
        "Submission_{}_{}.{extension}",
        week.employee().replace(' ', "_"),
        week.week_start()
    )
}

/// Encodes export rows into spreadsheet bytes.
pub trait Exporter {
    /// File extension of the produced document, without the dot.
    fn extension(&self) -> &str;

    fn encode(&self, rows: &[ExportRow]) -> Result<Vec<u8>, SubmitError>;

    fn export(&self, week: &Week) -> Result<Vec<u8>, SubmitError> {
        self.encode(&rows(week))
    }
}

/// Comma-separated spreadsheet with a header line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn extension(&self) -> &str {
        "csv"
    }

    fn encode(&self, rows: &[ExportRow]) -> Result<Vec<u8>, SubmitError> {
        // Header written by hand so an empty week still gets one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(HEADERS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| SubmitError::Io(e.into_error()))
    }
}

/// Writes an export document into `dir`, creating it if needed.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SubmitError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::week::TaskRef;
    use chrono::{DateTime, TimeZone, Utc, Weekday};

    fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
    }

    fn booked_week() -> Week {
        let mut week = Week::new(
            "Jayant Rai",
            "Technical",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        week.add_task(
            "Software Development",
            "Technical",
            vec!["Coding".into(), "Testing".into()],
        )
        .unwrap();
        week.add_task("Meeting", "Technical", vec!["Meeting".into()])
            .unwrap();
        let coding = TaskRef::with_subtask("Software Development", "Coding");
        week.start_session_at(Weekday::Mon, coding.clone(), at(1, 9, 0))
            .unwrap();
        week.stop_session_at(Weekday::Mon, at(1, 12, 0)).unwrap();
        week.start_session_at(Weekday::Mon, TaskRef::new("Meeting"), at(1, 12, 0))
            .unwrap();
        week.stop_session_at(Weekday::Mon, at(1, 12, 20)).unwrap();
        week.start_session_at(Weekday::Mon, coding, at(1, 13, 0))
            .unwrap();
        week.stop_session_at(Weekday::Mon, at(1, 17, 0)).unwrap();
        week.edit_note(Weekday::Mon, "release prep").unwrap();
        week.edit_note(Weekday::Wed, "sick leave").unwrap();
        week
    }

    #[test]
    fn rows_group_by_day_and_task() {
        let rows = rows(&booked_week());
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].task, "Software Development");
        assert_eq!(rows[0].subtask.as_deref(), Some("Coding"));
        assert_eq!(rows[0].hours, 7.0);
        assert_eq!(rows[0].notes, "release prep");

        assert_eq!(rows[1].task, "Meeting");
        assert_eq!(rows[1].hours, 0.33);

        assert_eq!(rows[2].day, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(rows[2].task, "");
        assert_eq!(rows[2].hours, 0.0);
        assert_eq!(rows[2].notes, "sick leave");
    }

    #[test]
    fn empty_week_has_no_rows_but_csv_has_header() {
        let week = Week::new("Ritu Das", "Marketing", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(rows(&week).is_empty());
        let bytes = CsvExporter.export(&week).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Employee,Department,Week Start,Day,Task,Subtask,Hours,Notes\n"
        );
    }

    #[test]
    fn csv_lines_follow_header() {
        let bytes = CsvExporter.export(&booked_week()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "Jayant Rai,Technical,2024-01-01,2024-01-01,Software Development,Coding,7.0,release prep"
        );
        assert_eq!(
            lines[3],
            "Jayant Rai,Technical,2024-01-01,2024-01-03,,,0.0,sick leave"
        );
    }

    #[test]
    fn file_name_uses_underscores() {
        let week = Week::new("Ritu Das", "Marketing", NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(
            export_file_name(&week, "csv"),
            "Submission_Ritu_Das_2024-01-01.csv"
        );
    }

    #[test]
    fn write_export_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("exports");
        let path = write_export(&target, "a.csv", b"x").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"x");
    }
}
