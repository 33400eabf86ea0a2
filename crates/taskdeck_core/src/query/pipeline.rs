//! Filter-then-sort pipeline for task snapshots.
//!
//! # Invariants
//! - Pure: the input snapshot is never mutated; same input, same output.
//! - Sorting is stable, so ties keep snapshot iteration order.
//! - The manual `order` field is not consulted here.
//! - The list view sorts priority HIGH first; the aggregate listing
//!   (`sort_by_priority_ascending`) sorts LOW first. The two stay separate.

use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort key for the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOption {
    /// Severity descending: HIGH, MEDIUM, LOW.
    #[default]
    Priority,
    /// Due date ascending.
    DueDate,
    /// Title ascending, case-sensitive.
    Title,
}

impl SortOption {
    pub const ALL: [SortOption; 3] = [SortOption::Priority, SortOption::DueDate, SortOption::Title];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Priority => "Priority",
            Self::DueDate => "Due Date",
            Self::Title => "Title",
        }
    }
}

/// Completion filter for the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOption {
    #[default]
    All,
    Completed,
    Pending,
}

impl FilterOption {
    pub const ALL: [FilterOption; 3] = [
        FilterOption::All,
        FilterOption::Completed,
        FilterOption::Pending,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Completed => "Completed",
            Self::Pending => "Pending",
        }
    }

    /// Returns whether `task` passes this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed,
            Self::Pending => !task.is_completed,
        }
    }
}

/// Active sort and filter pair backing one list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewSelection {
    pub sort: SortOption,
    pub filter: FilterOption,
}

impl ViewSelection {
    pub fn new(sort: SortOption, filter: FilterOption) -> Self {
        Self { sort, filter }
    }
}

/// Applies `selection` to one snapshot: filter first, then stable sort.
pub fn apply(tasks: &[Task], selection: ViewSelection) -> Vec<Task> {
    let mut view = filter_tasks(tasks, selection.filter);
    sort_tasks(&mut view, selection.sort);
    view
}

/// Returns clones of the tasks that pass `filter`, in snapshot order.
pub fn filter_tasks(tasks: &[Task], filter: FilterOption) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

/// Stable in-place sort by `sort`.
pub fn sort_tasks(tasks: &mut [Task], sort: SortOption) {
    match sort {
        SortOption::Priority => sort_by_priority_descending(tasks),
        SortOption::DueDate => tasks.sort_by_key(|task| task.due_date),
        SortOption::Title => tasks.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}

/// List-view ordering: HIGH, MEDIUM, LOW.
pub fn sort_by_priority_descending(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_priority(b, a));
}

/// Aggregate ordering used by "tasks by priority": LOW, MEDIUM, HIGH.
pub fn sort_by_priority_ascending(tasks: &mut [Task]) {
    tasks.sort_by(compare_priority);
}

fn compare_priority(a: &Task, b: &Task) -> Ordering {
    a.priority.cmp(&b.priority)
}
