//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide synchronous CRUD APIs over the `tasks` table.
//! - Keep SQL and column encoding inside the persistence boundary.
//!
//! # Invariants
//! - Insert ignores any caller-supplied id; SQLite assigns a fresh one.
//! - Update replaces every column of the matching row.
//! - Read paths reject undecodable rows instead of masking them.

use crate::db::DbError;
use crate::model::task::{normalize_description, Priority, Task, TaskId};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    dueDate,
    isCompleted,
    `order`
FROM tasks";

const PRIORITY_SEVERITY_SQL: &str =
    "CASE priority WHEN 'LOW' THEN 0 WHEN 'MEDIUM' THEN 1 WHEN 'HIGH' THEN 2 ELSE 3 END";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Row ordering for one-shot listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskListOrder {
    /// Storage iteration order (ascending id).
    #[default]
    Storage,
    /// Severity ascending: LOW, MEDIUM, HIGH.
    PriorityAscending,
    /// Due date ascending.
    DueDate,
    /// Title ascending, binary collation.
    Title,
}

/// Query options for listing tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// `Some(flag)` keeps only tasks whose completion equals `flag`.
    pub completed: Option<bool>,
    pub order: TaskListOrder,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Returns `false` when no row matched `task.id`.
    fn update_task(&self, task: &Task) -> RepoResult<bool>;
    /// Returns `false` when no row matched `id`.
    fn delete_task(&self, id: TaskId) -> RepoResult<bool>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Rewrites each record in its own statement, in slice order.
    ///
    /// There is no transaction around the batch: on failure the rows written
    /// before the failing one stay committed. Returns how many rows matched.
    pub fn rewrite_tasks(&self, tasks: &[Task]) -> RepoResult<usize> {
        let mut applied = 0;
        for task in tasks {
            if self.update_task(task)? {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (
                title,
                description,
                priority,
                dueDate,
                isCompleted,
                `order`
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.title.as_str(),
                normalize_description(task.description.clone()),
                task.priority.as_str(),
                task.due_date,
                bool_to_int(task.is_completed),
                task.order,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_task(&self, task: &Task) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                priority = ?3,
                dueDate = ?4,
                isCompleted = ?5,
                `order` = ?6
             WHERE id = ?7;",
            params![
                task.title.as_str(),
                normalize_description(task.description.clone()),
                task.priority.as_str(),
                task.due_date,
                bool_to_int(task.is_completed),
                task.order,
                task.id,
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = TASK_SELECT_SQL.to_string();

        match query.completed {
            Some(true) => sql.push_str(" WHERE isCompleted = 1"),
            Some(false) => sql.push_str(" WHERE isCompleted = 0"),
            None => {}
        }

        match query.order {
            TaskListOrder::Storage => sql.push_str(" ORDER BY id ASC"),
            TaskListOrder::PriorityAscending => {
                sql.push_str(&format!(" ORDER BY {PRIORITY_SEVERITY_SQL} ASC, id ASC"));
            }
            TaskListOrder::DueDate => sql.push_str(" ORDER BY dueDate ASC, id ASC"),
            TaskListOrder::Title => sql.push_str(" ORDER BY title ASC, id ASC"),
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority (id={id})"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("isCompleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid isCompleted value `{other}` in tasks.isCompleted (id={id})"
            )));
        }
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        description: normalize_description(row.get("description")?),
        priority,
        due_date: row.get("dueDate")?,
        is_completed,
        order: row.get("order")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
