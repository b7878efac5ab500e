use chrono::NaiveDateTime;
use duecycle_core::{DueValue, Priority, Repeat, Task};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated task draft produced by an import parser (store-agnostic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedTask {
    /// 1-based source line.
    pub line: usize,
    pub title: String,
    pub notes: String,
    pub group: String,
    pub priority: Priority,
    #[serde(default, with = "duecycle_core::task::due_storage")]
    pub due: Option<DueValue>,
    pub repeat: Repeat,
}

impl ImportedTask {
    /// Turn the draft into a fresh task with the store-assigned id.
    pub fn into_task(self, id: u64, created_at: NaiveDateTime) -> Task {
        let mut task = Task::new(id, self.title, created_at)
            .with_priority(self.priority)
            .with_repeat(self.repeat);
        task.due = self.due;
        task.notes = self.notes;
        task.group = self.group;
        task
    }
}

/// Why a single line was rejected. The rest of the import carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Line {line}: missing title.")]
    MissingTitle { line: usize },
    #[error("Line {line}: invalid due '{value}'. {reason}")]
    InvalidDue {
        line: usize,
        value: String,
        reason: String,
    },
    #[error(
        "Line {line}: invalid repeat '{value}'. Use none/daily/weekdays/weekly/bi-weekly/monthly/custom:<days>."
    )]
    InvalidRepeat { line: usize, value: String },
    #[error("Line {line}: custom repeat must be a positive day count, e.g. custom:6.")]
    CustomRepeatNotPositive { line: usize },
}

impl ImportError {
    pub fn line(&self) -> usize {
        match self {
            ImportError::MissingTitle { line }
            | ImportError::InvalidDue { line, .. }
            | ImportError::InvalidRepeat { line, .. }
            | ImportError::CustomRepeatNotPositive { line } => *line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub tasks: Vec<ImportedTask>,
    pub errors: Vec<ImportError>,
}

impl ImportReport {
    pub fn added(&self) -> usize {
        self.tasks.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}
