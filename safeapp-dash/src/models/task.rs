//! Tasks as returned by the task-list webhook

use safeapp_common::CanonicalRow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Completion status; unknown values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    NeedsAction,
    Completed,
    Other(String),
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "needsAction" => TaskStatus::NeedsAction,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::NeedsAction => "needsAction".to_string(),
            TaskStatus::Completed => "completed".to_string(),
            TaskStatus::Other(s) => s,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NeedsAction
    }
}

/// One task. Fields we do not model are carried through `extra` so an
/// update sends the task back whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Copy with the completion status flipped
    pub fn toggled(&self) -> Task {
        let mut task = self.clone();
        task.status = if self.is_completed() {
            TaskStatus::NeedsAction
        } else {
            TaskStatus::Completed
        };
        task
    }

    /// Decode every row, skipping those without an id
    pub fn from_rows(rows: Vec<CanonicalRow>) -> Vec<Task> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<Task>(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable task");
                    None
                }
            })
            .collect()
    }
}

/// Non-completed tasks first; order is otherwise kept
pub fn sort_pending_first(tasks: &mut [Task]) {
    tasks.sort_by_key(Task::is_completed);
}
