use serde::{Deserialize, Serialize};

use super::session::TaskRef;

/// A department-scoped task with its subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        subtasks: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            subtasks,
        }
    }

    pub fn has_subtask(&self, subtask: &str) -> bool {
        self.subtasks.iter().any(|s| s == subtask)
    }

    /// Whether `task_ref` names this task and, if given, one of its subtasks.
    pub fn accepts(&self, task_ref: &TaskRef) -> bool {
        task_ref.task == self.name
            && task_ref
                .subtask
                .as_deref()
                .map_or(true, |sub| self.has_subtask(sub))
    }
}
