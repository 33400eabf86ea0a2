//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical record behind every list row and edit screen.
//! - Define the fixed three-level priority scale and its severity order.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `title` is never blank for tasks built through `Task::new`.
//! - `Priority` has a total order `Low < Medium < High`.
//! - An empty `description` is equivalent to `None`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Identifier carried by tasks that have not been persisted yet.
pub const UNSAVED_TASK_ID: TaskId = 0;

/// Offset applied by `default_due_date`: one day in milliseconds.
pub const DEFAULT_DUE_OFFSET_MS: i64 = 24 * 60 * 60 * 1000;

/// Severity classification of a task.
///
/// Declaration order is the severity order; derived `Ord` relies on it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// All levels, lowest severity first.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Numeric severity rank, `Low = 0`.
    pub fn severity(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Stable storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parses a storage label. Returns `None` for anything outside the scale.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Validation errors raised before a task reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Mutated only by whole-record replacement through the store `update`.
/// Deserialization runs the same title check and description folding as
/// [`Task::new`] and [`Task::with_description`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    /// `UNSAVED_TASK_ID` until the store assigns one.
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_date: i64,
    pub is_completed: bool,
    /// Manual drag-order hint. Not unique, not contiguous.
    pub order: i64,
}

impl Task {
    /// Builds an unsaved task, rejecting blank titles.
    ///
    /// # Errors
    /// - `TaskValidationError::EmptyTitle` when `title` trims to empty.
    pub fn new(
        title: impl Into<String>,
        priority: Priority,
        due_date: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id: UNSAVED_TASK_ID,
            title: title.into(),
            description: None,
            priority,
            due_date,
            is_completed: false,
            order: 0,
        };
        task.validate()?;
        Ok(task)
    }

    /// Sets the description, folding empty text into `None`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = normalize_description(Some(description.into()));
        self
    }

    /// Checks user-facing invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns whether the store has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_TASK_ID
    }

    /// Description with empty text treated as absent.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|value| !value.is_empty())
    }
}

/// Wire shape of [`Task`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(default)]
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    due_date: i64,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    order: i64,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: record.id,
            title: record.title,
            description: normalize_description(record.description),
            priority: record.priority,
            due_date: record.due_date,
            is_completed: record.is_completed,
            order: record.order,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Folds `Some("")` into `None`.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|value| !value.is_empty())
}

/// Default due date offered for a new task: one day after `now_epoch_ms`.
pub fn default_due_date(now_epoch_ms: i64) -> i64 {
    now_epoch_ms.saturating_add(DEFAULT_DUE_OFFSET_MS)
}

#[cfg(test)]
mod tests {
    use super::{default_due_date, Priority, Task, TaskValidationError, UNSAVED_TASK_ID};

    #[test]
    fn new_rejects_blank_title() {
        let err = Task::new("   \t", Priority::High, 0).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyTitle);
    }

    #[test]
    fn new_task_starts_unsaved_and_pending() {
        let task = Task::new("Buy milk", Priority::Low, 1_000).unwrap();
        assert_eq!(task.id, UNSAVED_TASK_ID);
        assert!(!task.is_persisted());
        assert!(!task.is_completed);
        assert_eq!(task.order, 0);
        assert_eq!(task.description, None);
    }

    #[test]
    fn empty_description_is_absent() {
        let task = Task::new("t", Priority::Low, 0).unwrap().with_description("");
        assert_eq!(task.description, None);
        assert_eq!(task.description(), None);
    }

    #[test]
    fn priority_order_is_low_medium_high() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::default(), Priority::Medium);
        for level in Priority::ALL {
            assert_eq!(Priority::parse(level.as_str()), Some(level));
        }
        assert_eq!(Priority::parse("URGENT"), None);
    }

    #[test]
    fn deserializing_checks_title_and_folds_empty_description() {
        let blank = r#"{"title":"  ","priority":"LOW","dueDate":0}"#;
        let err = serde_json::from_str::<Task>(blank).unwrap_err();
        assert!(err.to_string().contains("title must not be blank"));

        let task: Task = serde_json::from_str(
            r#"{"id":7,"title":"Buy milk","description":"","priority":"HIGH","dueDate":5,"isCompleted":true,"order":2}"#,
        )
        .unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.id, 7);
        assert!(task.is_completed);

        let minimal: Task = serde_json::from_str(r#"{"title":"t","dueDate":0}"#).unwrap();
        assert_eq!(minimal.id, UNSAVED_TASK_ID);
        assert_eq!(minimal.priority, Priority::Medium);
    }

    #[test]
    fn default_due_date_is_one_day_later() {
        assert_eq!(default_due_date(1_000), 1_000 + 86_400_000);
    }
}
