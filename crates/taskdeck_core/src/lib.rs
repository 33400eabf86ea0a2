//! Core task store and query pipeline for taskdeck.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod query;
pub mod reorder;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{CoreConfig, DbLocation};
pub use live::{LiveQuery, Snapshot, TaskView};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::task::{
    default_due_date, Priority, Task, TaskId, TaskValidationError, UNSAVED_TASK_ID,
};
pub use query::pipeline::{FilterOption, SortOption, ViewSelection};
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskListOrder, TaskListQuery, TaskRepository,
};
pub use service::task_service::{ServiceError, ServiceResult, TaskService};
pub use store::{LazyTaskStore, StoreError, StoreResult, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
