//! Task use-case service.
//!
//! # Responsibility
//! - Single entry point for presentation code: CRUD, reorder, sort/filter
//!   selection and the live list view.
//! - Reject invalid input before it reaches the store.
//!
//! # Invariants
//! - Session selection defaults to sort=PRIORITY, filter=ALL.
//! - Changing the selection re-derives every open view; it never touches
//!   storage.
//! - Missing ids on update/delete/reorder are silent no-ops.

use crate::live::TaskView;
use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::query::pipeline::{self, FilterOption, SortOption, ViewSelection};
use crate::store::{StoreError, TaskStore};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::watch;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any store call.
    Validation(TaskValidationError),
    /// Storage failure propagated from the store.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for ServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Task service facade over a shared store handle.
pub struct TaskService {
    store: TaskStore,
    selection: watch::Sender<ViewSelection>,
}

impl TaskService {
    /// Creates a service with the default selection.
    pub fn new(store: TaskStore) -> Self {
        Self::with_selection(store, ViewSelection::default())
    }

    /// Creates a service starting from `selection`.
    pub fn with_selection(store: TaskStore, selection: ViewSelection) -> Self {
        let (selection, _) = watch::channel(selection);
        Self { store, selection }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn selection(&self) -> ViewSelection {
        *self.selection.borrow()
    }

    /// Live list view; yields immediately, then after every store publish
    /// or selection change. Dropping it cancels the subscription.
    pub fn view(&self) -> TaskView {
        TaskView::new(self.store.snapshots(), self.selection.subscribe())
    }

    /// One-shot evaluation of the list view.
    pub fn current_view(&self) -> Vec<Task> {
        pipeline::apply(self.store.snapshot().as_slice(), self.selection())
    }

    pub fn change_sort(&self, sort: SortOption) {
        self.update_selection(|selection| selection.sort = sort);
    }

    pub fn change_filter(&self, filter: FilterOption) {
        self.update_selection(|selection| selection.filter = filter);
    }

    /// Validates and inserts `task`; returns the assigned id.
    pub async fn insert_task(&self, task: Task) -> ServiceResult<TaskId> {
        task.validate()?;
        Ok(self.store.insert(task).await?)
    }

    /// Validates and replaces the stored record with `task.id`.
    pub async fn update_task(&self, task: Task) -> ServiceResult<()> {
        task.validate()?;
        self.store.update(task).await?;
        Ok(())
    }

    pub async fn delete_task(&self, task: &Task) -> ServiceResult<()> {
        self.store.delete(task).await?;
        Ok(())
    }

    /// Flips the completion flag of task `id` through a whole-record update.
    ///
    /// Returns the updated record, or `None` when the task does not exist.
    pub async fn toggle_completed(&self, id: TaskId) -> ServiceResult<Option<Task>> {
        let Some(mut task) = self.store.get(id).await? else {
            return Ok(None);
        };
        task.is_completed = !task.is_completed;
        let applied = self.store.update(task.clone()).await?;
        Ok(applied.then_some(task))
    }

    /// Moves the displayed task at `from` to position `to`.
    ///
    /// Indices refer to the list view under the current selection. Every
    /// task is rewritten; displayed tasks get their new position as
    /// `order`. Returns `false` when the gesture was a no-op.
    pub async fn reorder_tasks(&self, from: usize, to: usize) -> ServiceResult<bool> {
        let applied = self.store.reorder(self.selection(), from, to).await?;
        if applied.is_none() {
            debug!("event=task_reorder module=service status=noop from={from} to={to}");
        }
        Ok(applied.is_some())
    }

    /// Single read used to pre-populate edit screens.
    pub async fn get_task_by_id(&self, id: TaskId) -> ServiceResult<Option<Task>> {
        Ok(self.store.get(id).await?)
    }

    /// Aggregate listing by severity, ascending.
    pub async fn tasks_by_priority(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.tasks_by_priority().await?)
    }

    fn update_selection(&self, change: impl FnOnce(&mut ViewSelection)) {
        let changed = self.selection.send_if_modified(|selection| {
            let before = *selection;
            change(selection);
            *selection != before
        });
        if changed {
            let selection = self.selection();
            debug!(
                "event=view_selection module=service status=ok sort={:?} filter={:?}",
                selection.sort, selection.filter
            );
        }
    }
}
