//! Live views over the task table.
//!
//! # Responsibility
//! - Fan one published snapshot out to any number of subscribers.
//! - Project snapshots into what a subscriber asked for (all rows, one row,
//!   a sorted/filtered view).
//!
//! # Invariants
//! - The first `next()` on a fresh subscription yields the current value
//!   without waiting.
//! - Later `next()` calls wait for the next publish and yield the newest
//!   value; intermediate snapshots may be conflated.
//! - `next()` yields `None` once every publisher is gone.
//! - Dropping a subscription releases its receivers immediately.

use crate::model::task::{Task, TaskId};
use crate::query::pipeline::{self, ViewSelection};
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable full-table snapshot shared between subscribers.
pub type Snapshot = Arc<Vec<Task>>;

type Projection<T> = Arc<dyn Fn(&Snapshot) -> T + Send + Sync>;

/// Subscription to store snapshots, mapped through a projection.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Snapshot>,
    project: Projection<T>,
    primed: bool,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new(
        rx: watch::Receiver<Snapshot>,
        project: impl Fn(&Snapshot) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            project: Arc::new(project),
            primed: false,
        }
    }

    /// Projects the latest snapshot without waiting.
    pub fn current(&self) -> T {
        (self.project)(&*self.rx.borrow())
    }

    /// Yields the current value first, then one value per publish.
    pub async fn next(&mut self) -> Option<T> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        let value = (self.project)(&*self.rx.borrow_and_update());
        Some(value)
    }
}

/// Every task in storage order.
pub fn all_tasks(rx: watch::Receiver<Snapshot>) -> LiveQuery<Vec<Task>> {
    LiveQuery::new(rx, |snapshot| snapshot.to_vec())
}

/// One task, `None` while absent or after deletion.
pub fn task_by_id(rx: watch::Receiver<Snapshot>, id: TaskId) -> LiveQuery<Option<Task>> {
    LiveQuery::new(rx, move |snapshot| {
        snapshot.iter().find(|task| task.id == id).cloned()
    })
}

/// Sorted/filtered list view that also reacts to selection changes.
pub struct TaskView {
    tasks: watch::Receiver<Snapshot>,
    selection: watch::Receiver<ViewSelection>,
    primed: bool,
}

impl TaskView {
    pub(crate) fn new(
        tasks: watch::Receiver<Snapshot>,
        selection: watch::Receiver<ViewSelection>,
    ) -> Self {
        Self {
            tasks,
            selection,
            primed: false,
        }
    }

    /// Evaluates the view against the latest snapshot and selection.
    pub fn current(&self) -> Vec<Task> {
        let selection = *self.selection.borrow();
        let tasks = self.tasks.borrow();
        pipeline::apply(tasks.as_slice(), selection)
    }

    /// Selection the view is currently rendered with.
    pub fn selection(&self) -> ViewSelection {
        *self.selection.borrow()
    }

    /// Yields the current view first, then one per store publish or
    /// selection change.
    pub async fn next(&mut self) -> Option<Vec<Task>> {
        if self.primed {
            tokio::select! {
                changed = self.tasks.changed() => changed.ok()?,
                changed = self.selection.changed() => changed.ok()?,
            }
        }
        self.primed = true;
        let selection = *self.selection.borrow_and_update();
        let tasks = self.tasks.borrow_and_update();
        Some(pipeline::apply(tasks.as_slice(), selection))
    }
}
