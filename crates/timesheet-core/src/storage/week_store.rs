//! Week persistence.
//!
//! All weeks live in one JSON document keyed by `"<employee>::<week_start>"`:
//!
//! ```json
//! {
//!   "Jayant Rai::2024-01-01": { "employee": "Jayant Rai", "days": [...], "state": "open", ... }
//! }
//! ```
//!
//! Records are decoded one at a time, so a damaged record only affects
//! its own week.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::directory::Directory;
use crate::error::{CoreError, StoreError};
use crate::events::Event;
use crate::week::{Week, WeekKey};

type Document = BTreeMap<String, serde_json::Value>;

/// Bookkeeping written after a week was submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submitted_at: Option<DateTime<Utc>>,
    /// Spreadsheet written for the submission, if any.
    #[serde(default)]
    pub export_file: Option<String>,
    /// Hex SHA-256 of the exported bytes.
    #[serde(default)]
    pub export_sha256: Option<String>,
    /// Whether the remote endpoint accepted the week. `None` when not attempted.
    #[serde(default)]
    pub server_upload: Option<bool>,
}

/// A week as stored, with its submission receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWeek {
    #[serde(flatten)]
    pub week: Week,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

/// Persistence gateway.
pub trait WeekStore {
    fn load_record(&self, key: &WeekKey) -> Result<StoredWeek, StoreError>;

    fn save_record(&self, record: &StoredWeek) -> Result<(), StoreError>;

    /// Keys of every stored week, sorted.
    fn keys(&self) -> Result<Vec<WeekKey>, StoreError>;

    fn load(&self, key: &WeekKey) -> Result<Week, StoreError> {
        Ok(self.load_record(key)?.week)
    }

    /// Save the week, keeping any receipt already stored with it.
    fn save(&self, week: &Week) -> Result<(), StoreError> {
        let receipt = match self.load_record(&week.key()) {
            Ok(existing) => existing.receipt,
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };
        self.save_record(&StoredWeek {
            week: week.clone(),
            receipt,
        })
    }

    fn save_receipt(&self, key: &WeekKey, receipt: SubmissionReceipt) -> Result<(), StoreError> {
        let mut record = self.load_record(key)?;
        record.receipt = Some(receipt);
        self.save_record(&record)
    }
}

/// Load the week for `employee` containing `date`, or create an empty one.
///
/// A newly created week is persisted right away; its department comes from
/// the directory. Returns the week and, when it was created, the event.
pub fn load_or_create<S: WeekStore + ?Sized>(
    store: &S,
    directory: &Directory,
    employee: &str,
    date: NaiveDate,
) -> Result<(Week, Option<Event>), CoreError> {
    let key = WeekKey::new(employee, date);
    match store.load(&key) {
        Ok(week) => Ok((week, None)),
        Err(StoreError::NotFound(_)) => {
            let department = directory
                .department_of(employee)
                .ok_or_else(|| CoreError::UnknownEmployee(employee.to_string()))?;
            let week = Week::new(employee, department, key.week_start);
            store.save(&week)?;
            info!(%key, department, "created week");
            let event = Event::WeekCreated {
                employee: employee.to_string(),
                department: department.to_string(),
                week_start: key.week_start,
                at: Utc::now(),
            };
            Ok((week, Some(event)))
        }
        Err(err) => Err(err.into()),
    }
}

fn decode(key: &str, value: serde_json::Value) -> Result<StoredWeek, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode_keys(doc: &Document) -> Result<Vec<WeekKey>, StoreError> {
    doc.keys()
        .map(|k| {
            k.parse::<WeekKey>().map_err(|message| StoreError::Corrupt {
                key: k.clone(),
                message,
            })
        })
        .collect()
}

fn lookup(doc: &mut Document, key: &WeekKey) -> Result<StoredWeek, StoreError> {
    let name = key.to_string();
    let value = doc
        .remove(&name)
        .ok_or_else(|| StoreError::NotFound(name.clone()))?;
    let record = decode(&name, value)?;
    if record.week.key() != *key {
        return Err(StoreError::Corrupt {
            key: name,
            message: format!("record belongs to {}", record.week.key()),
        });
    }
    Ok(record)
}

/// JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read the whole document. A missing file is an empty document.
    fn read_document(&self) -> Result<Document, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Write via a sibling temp file so a crash never truncates the document.
    fn write_document(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

impl WeekStore for JsonFileStore {
    fn load_record(&self, key: &WeekKey) -> Result<StoredWeek, StoreError> {
        let mut doc = self.read_document()?;
        lookup(&mut doc, key)
    }

    fn save_record(&self, record: &StoredWeek) -> Result<(), StoreError> {
        let key = record.week.key();
        let mut doc = self.read_document()?;
        doc.insert(key.to_string(), serde_json::to_value(record)?);
        self.write_document(&doc)?;
        debug!(%key, path = %self.path.display(), "saved week");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<WeekKey>, StoreError> {
        decode_keys(&self.read_document()?)
    }
}

/// In-memory store holding the same JSON values the file store would.
#[derive(Default)]
pub struct MemoryStore {
    doc: RefCell<Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.doc.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.borrow().is_empty()
    }
}

impl WeekStore for MemoryStore {
    fn load_record(&self, key: &WeekKey) -> Result<StoredWeek, StoreError> {
        let mut doc = self.doc.borrow().clone();
        lookup(&mut doc, key)
    }

    fn save_record(&self, record: &StoredWeek) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.doc
            .borrow_mut()
            .insert(record.week.key().to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<WeekKey>, StoreError> {
        decode_keys(&self.doc.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use crate::week::{TaskRef, WeekState};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn directory() -> Directory {
        Directory::from_toml_str(
            "[employees]\n\"Ritu Das\" = \"Marketing\"\n\n[departments.Marketing]\n\"Meeting\" = [\"Meeting\"]\n",
        )
        .unwrap()
    }

    #[test]
    fn missing_week_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load(&WeekKey::new("Ritu Das", monday())).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(k) if k == "Ritu Das::2024-01-01"));
    }

    #[test]
    fn load_or_create_persists_new_week() {
        let store = MemoryStore::new();
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let (week, event) = load_or_create(&store, &directory(), "Ritu Das", wednesday).unwrap();
        assert_eq!(week.department(), "Marketing");
        assert_eq!(week.week_start(), monday());
        assert!(matches!(event, Some(Event::WeekCreated { .. })));
        assert_eq!(store.len(), 1);

        let (again, event) = load_or_create(&store, &directory(), "Ritu Das", monday()).unwrap();
        assert_eq!(again, week);
        assert!(event.is_none());
    }

    #[test]
    fn load_or_create_rejects_unknown_employee() {
        let store = MemoryStore::new();
        let err = load_or_create(&store, &directory(), "Nobody", monday()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEmployee(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn save_keeps_existing_receipt() {
        let store = MemoryStore::new();
        let mut week = Week::new("Ritu Das", "Marketing", monday());
        store.save(&week).unwrap();
        week.submit().unwrap();
        store.save(&week).unwrap();
        let receipt = SubmissionReceipt {
            submitted_at: week.submitted_at(),
            server_upload: Some(false),
            ..Default::default()
        };
        store.save_receipt(&week.key(), receipt.clone()).unwrap();
        store.save(&week).unwrap();

        let record = store.load_record(&week.key()).unwrap();
        assert_eq!(record.receipt, Some(receipt));
        assert_eq!(record.week.state(), WeekState::Locked);
    }

    #[test]
    fn corrupt_record_does_not_hide_others() {
        let store = MemoryStore::new();
        let week = Week::new("Ritu Das", "Marketing", monday());
        store.save(&week).unwrap();
        store
            .doc
            .borrow_mut()
            .insert("Ritu Das::2024-01-08".into(), serde_json::json!({"days": 3}));

        assert!(store.load(&week.key()).is_ok());
        let other = WeekKey::new("Ritu Das", NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert!(matches!(store.load(&other), Err(StoreError::Corrupt { .. })));
        assert_eq!(store.keys().unwrap().len(), 2);
    }

    #[test]
    fn non_monday_key_is_corrupt_not_renamed() {
        let store = MemoryStore::new();
        let week = Week::new("Ritu Das", "Marketing", monday());
        store.save(&week).unwrap();
        let value = store.doc.borrow_mut().remove("Ritu Das::2024-01-01").unwrap();
        store
            .doc
            .borrow_mut()
            .insert("Ritu Das::2024-01-03".into(), value);

        match store.keys() {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, "Ritu Das::2024-01-03"),
            other => panic!("Expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("timesheet_data.json"));
        assert!(store.keys().unwrap().is_empty());

        let mut week = Week::new("Ritu Das", "Marketing", monday());
        week.add_task("Meeting", "Marketing", vec!["Meeting".into()])
            .unwrap();
        week.start_session(Weekday::Mon, TaskRef::new("Meeting"))
            .unwrap();
        week.edit_note(Weekday::Mon, "stand-up").unwrap();
        store.save(&week).unwrap();

        let loaded = store.load(&week.key()).unwrap();
        assert_eq!(loaded, week);
        assert_eq!(loaded.day(Weekday::Mon).notes(), "stand-up");
        assert!(loaded.running_session().is_some());
        assert_eq!(store.keys().unwrap(), vec![week.key()]);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_reports_malformed_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("timesheet_data.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(store.keys(), Err(StoreError::Json(_))));
    }
}
