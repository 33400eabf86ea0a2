//! Shared task store handle.
//!
//! # Responsibility
//! - Own the single SQLite connection of the application.
//! - Run every read and write on tokio's blocking pool, never on the
//!   caller's thread.
//! - Publish the full task set after every committed mutation that changed
//!   it.
//!
//! # Invariants
//! - The connection mutex serializes writers; effects match some sequential
//!   interleaving.
//! - Snapshots are published while the connection lock is still held, so
//!   publish order equals commit order.
//! - A store is only handed out after migrations succeeded.

use crate::config::CoreConfig;
use crate::db::open_db_with;
use crate::live::{self, LiveQuery, Snapshot};
use crate::model::task::{Task, TaskId};
use crate::query::pipeline::{self, ViewSelection};
use crate::reorder::plan_reorder;
use crate::repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListOrder, TaskListQuery, TaskRepository,
};
use log::{debug, error, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, OnceCell};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Persistence failure, including failed open or migration.
    Repo(RepoError),
    /// The write committed but reloading the table for subscribers failed;
    /// live queries keep the previous snapshot.
    StaleSnapshot(RepoError),
    /// The blocking job panicked or was cancelled before completing.
    Worker(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::StaleSnapshot(err) => {
                write!(f, "write committed but snapshot reload failed: {err}")
            }
            Self::Worker(message) => write!(f, "store worker failed: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) | Self::StaleSnapshot(err) => Some(err),
            Self::Worker(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

struct StoreInner {
    conn: Mutex<Connection>,
    snapshots: watch::Sender<Snapshot>,
}

impl StoreInner {
    /// Reloads the table and publishes it when it differs from the last
    /// published snapshot.
    fn publish(&self, repo: &SqliteTaskRepository<'_>) -> RepoResult<()> {
        let fresh = repo.list_tasks(&TaskListQuery::default()).map_err(|err| {
            error!(
                "event=store_publish module=store status=error error_code=snapshot_reload_failed error={}",
                err
            );
            err
        })?;
        let published = self.snapshots.send_if_modified(|current| {
            if current.as_slice() == fresh.as_slice() {
                return false;
            }
            *current = Arc::new(fresh);
            true
        });
        debug!(
            "event=store_publish module=store status={} subscribers={}",
            if published { "ok" } else { "noop" },
            self.snapshots.receiver_count()
        );
        Ok(())
    }
}

/// Cloneable handle to the application's task store.
///
/// Obtain it once at startup and pass it to every component that needs it.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    /// Opens (and migrates) the database described by `config`.
    ///
    /// # Errors
    /// - `StoreError::Repo` when the database cannot be opened or migrated;
    ///   no handle is produced in that case.
    pub async fn open(config: &CoreConfig) -> StoreResult<Self> {
        let location = config.db.clone();
        let busy_timeout = config.busy_timeout;
        let started_at = Instant::now();

        let (conn, initial) = spawn_store_job(move || -> RepoResult<(Connection, Vec<Task>)> {
            let conn = open_db_with(&location, busy_timeout)?;
            let initial = SqliteTaskRepository::new(&conn).list_tasks(&TaskListQuery::default())?;
            Ok((conn, initial))
        })
        .await
        .inspect_err(|err| {
            error!(
                "event=store_init module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
        })?;

        info!(
            "event=store_init module=store status=ok duration_ms={} task_count={}",
            started_at.elapsed().as_millis(),
            initial.len()
        );
        Ok(Self::from_parts(conn, initial))
    }

    /// Opens a fresh in-memory store.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open(&CoreConfig::in_memory()).await
    }

    fn from_parts(conn: Connection, initial: Vec<Task>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                snapshots,
            }),
        }
    }

    /// Persists `task` under a newly assigned id and returns that id.
    ///
    /// Any id carried by `task` is ignored.
    pub async fn insert(&self, task: Task) -> StoreResult<TaskId> {
        let id = self
            .mutate("task_insert", move |repo| repo.insert_task(&task))
            .await?;
        info!("event=task_insert module=store status=ok task_id={id}");
        Ok(id)
    }

    /// Replaces the stored record with `task.id`.
    ///
    /// Returns `false` without writing anything when no such row exists.
    pub async fn update(&self, task: Task) -> StoreResult<bool> {
        let id = task.id;
        let applied = self
            .mutate("task_update", move |repo| repo.update_task(&task))
            .await?;
        log_applied("task_update", id, applied);
        Ok(applied)
    }

    /// Permanently removes the record matching `task.id`.
    ///
    /// Deleting a missing task is a no-op that returns `false`.
    pub async fn delete(&self, task: &Task) -> StoreResult<bool> {
        self.delete_by_id(task.id).await
    }

    /// Permanently removes the record with `id`; `false` when absent.
    pub async fn delete_by_id(&self, id: TaskId) -> StoreResult<bool> {
        let applied = self
            .mutate("task_delete", move |repo| repo.delete_task(id))
            .await?;
        log_applied("task_delete", id, applied);
        Ok(applied)
    }

    /// Rewrites `tasks` one row at a time, without a surrounding transaction.
    ///
    /// On failure the rows written before the failing one stay committed and
    /// are published; the error is returned. Returns how many rows matched.
    pub async fn rewrite_all(&self, tasks: Vec<Task>) -> StoreResult<usize> {
        let total = tasks.len();
        let applied = self
            .mutate("task_rewrite", move |repo| repo.rewrite_tasks(&tasks))
            .await?;
        info!("event=task_rewrite module=store status=ok rows={total} applied={applied}");
        Ok(applied)
    }

    /// Moves the task at `from` to `to` within the list shown under
    /// `selection`, then rewrites every task row by row.
    ///
    /// Reading, planning and writing happen under one connection lock, so no
    /// other write can land between them. The rewrite itself is not a
    /// transaction; see [`TaskStore::rewrite_all`]. Returns `Ok(None)` when
    /// the indices make the move a no-op.
    pub async fn reorder(
        &self,
        selection: ViewSelection,
        from: usize,
        to: usize,
    ) -> StoreResult<Option<usize>> {
        let applied = self
            .mutate("task_reorder", move |repo| {
                let full = repo.list_tasks(&TaskListQuery::default())?;
                let displayed = pipeline::apply(&full, selection);
                match plan_reorder(&full, &displayed, from, to) {
                    Some(plan) => repo.rewrite_tasks(&plan).map(Some),
                    None => {
                        debug!(
                            "event=task_reorder module=store status=noop from={} to={} displayed={}",
                            from,
                            to,
                            displayed.len()
                        );
                        Ok(None)
                    }
                }
            })
            .await?;
        if let Some(rewritten) = applied {
            info!("event=task_reorder module=store status=ok from={from} to={to} rewritten={rewritten}");
        }
        Ok(applied)
    }

    /// Single read of one task.
    pub async fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.read(move |repo| repo.get_task(id)).await
    }

    /// Single read of tasks matching `query`.
    pub async fn list(&self, query: TaskListQuery) -> StoreResult<Vec<Task>> {
        self.read(move |repo| repo.list_tasks(&query)).await
    }

    /// Every task in storage order.
    pub async fn all_tasks(&self) -> StoreResult<Vec<Task>> {
        self.list(TaskListQuery::default()).await
    }

    /// Aggregate listing by severity, ascending: LOW, MEDIUM, HIGH.
    pub async fn tasks_by_priority(&self) -> StoreResult<Vec<Task>> {
        self.list(ordered(TaskListOrder::PriorityAscending)).await
    }

    /// All tasks by due date, earliest first.
    pub async fn tasks_by_due_date(&self) -> StoreResult<Vec<Task>> {
        self.list(ordered(TaskListOrder::DueDate)).await
    }

    /// All tasks by title, binary collation.
    pub async fn tasks_by_title(&self) -> StoreResult<Vec<Task>> {
        self.list(ordered(TaskListOrder::Title)).await
    }

    /// Tasks with the given completion flag, by ascending severity.
    pub async fn tasks_by_completion(&self, is_completed: bool) -> StoreResult<Vec<Task>> {
        self.list(TaskListQuery {
            completed: Some(is_completed),
            order: TaskListOrder::PriorityAscending,
        })
        .await
    }

    /// Live full-table subscription.
    ///
    /// The first `next()` replays the current snapshot. After that a value is
    /// delivered only when a write changed the table: a no-op update or
    /// delete, or a rewrite of identical rows, publishes nothing and wakes no
    /// subscriber. Rapid writes may be conflated into their latest state.
    pub fn query_all(&self) -> LiveQuery<Vec<Task>> {
        live::all_tasks(self.snapshots())
    }

    /// Live subscription to one task; yields `None` while it is absent.
    pub fn query_by_id(&self, id: TaskId) -> LiveQuery<Option<Task>> {
        live::task_by_id(self.snapshots(), id)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.inner.snapshots.borrow())
    }

    /// Number of live receivers attached to this store.
    pub fn subscriber_count(&self) -> usize {
        self.inner.snapshots.receiver_count()
    }

    /// Returns whether both handles point at the same store.
    pub fn same_store(&self, other: &TaskStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    async fn read<T, F>(&self, job: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTaskRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        spawn_store_job(move || {
            let conn = inner.conn.lock();
            job(&SqliteTaskRepository::new(&conn))
        })
        .await
    }

    async fn mutate<T, F>(&self, event: &'static str, job: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTaskRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let started_at = Instant::now();
        let result = spawn_blocking_job(move || {
            let conn = inner.conn.lock();
            let repo = SqliteTaskRepository::new(&conn);
            let result = job(&repo).map_err(StoreError::from);
            // Partial batches still change the table; publish either way.
            let published = inner.publish(&repo);
            match (result, published) {
                (Ok(_), Err(err)) => Err(StoreError::StaleSnapshot(err)),
                (result, _) => result,
            }
        })
        .await;

        if let Err(err) = &result {
            error!(
                "event={} module=store status=error duration_ms={} error={}",
                event,
                started_at.elapsed().as_millis(),
                err
            );
        }
        result
    }
}

/// Opens the store on first use and hands out the same handle afterwards.
///
/// Concurrent first callers share one open attempt. A failed attempt is
/// returned to its callers and is not cached.
pub struct LazyTaskStore {
    config: CoreConfig,
    cell: OnceCell<TaskStore>,
}

impl LazyTaskStore {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Returns the store, opening and migrating it if needed.
    pub async fn get(&self) -> StoreResult<TaskStore> {
        self.cell
            .get_or_try_init(|| TaskStore::open(&self.config))
            .await
            .cloned()
    }

    /// Returns whether initialization already succeeded.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

fn ordered(order: TaskListOrder) -> TaskListQuery {
    TaskListQuery {
        completed: None,
        order,
    }
}

fn log_applied(event: &str, id: TaskId, applied: bool) {
    if applied {
        info!("event={event} module=store status=ok task_id={id}");
    } else {
        debug!("event={event} module=store status=noop reason=not_found task_id={id}");
    }
}

async fn spawn_store_job<T, F>(job: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RepoResult<T> + Send + 'static,
{
    spawn_blocking_job(move || job().map_err(StoreError::from)).await
}

async fn spawn_blocking_job<T, F>(job: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))?
}
