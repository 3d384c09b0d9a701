//! Reference data: who works in which department, and which tasks and
//! subtasks each department books time against.
//!
//! The organisation directory ships embedded in the crate and can be
//! replaced by a TOML file of the same shape (`directory.path` in config):
//!
//! ```toml
//! [employees]
//! "Jayant Rai" = "Technical"
//!
//! [departments.Technical]
//! "Meeting" = ["Meeting"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DirectoryError;
use crate::storage::Config;
use crate::week::Task;

const BUILTIN_DIRECTORY: &str = include_str!("../data/directory.toml");

/// Employee -> department and department -> task -> subtasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    employees: BTreeMap<String, String>,
    #[serde(default)]
    departments: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Directory {
    /// The directory bundled with the crate.
    pub fn builtin() -> Result<Self, DirectoryError> {
        Self::from_toml_str(BUILTIN_DIRECTORY)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DirectoryError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The configured directory file, or the builtin one.
    pub fn from_config(config: &Config) -> Result<Self, DirectoryError> {
        match config.directory.path.as_deref() {
            Some(path) if !path.is_empty() => Self::load_from(Path::new(path)),
            _ => Self::builtin(),
        }
    }

    /// Employee names, sorted.
    pub fn employees(&self) -> impl Iterator<Item = &str> {
        self.employees.keys().map(String::as_str)
    }

    pub fn department_of(&self, employee: &str) -> Option<&str> {
        self.employees.get(employee).map(String::as_str)
    }

    /// Task names of a department, sorted. Unknown departments have none.
    pub fn tasks_for(&self, department: &str) -> Vec<&str> {
        self.departments
            .get(department)
            .map(|tasks| tasks.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn subtasks_for(&self, department: &str, task: &str) -> Option<&[String]> {
        self.departments
            .get(department)?
            .get(task)
            .map(Vec::as_slice)
    }

    /// Builds the week task for a catalogue entry.
    pub fn task_for(&self, department: &str, task: &str) -> Option<Task> {
        self.subtasks_for(department, task)
            .map(|subtasks| Task::new(task, department, subtasks.to_vec()))
    }
}
