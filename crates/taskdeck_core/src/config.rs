//! Runtime configuration for the task core.
//!
//! # Responsibility
//! - Describe where the task database lives and how it is opened.
//! - Resolve logging settings from the process environment.
//!
//! # Invariants
//! - Configuration is plain data handed to `TaskStore::open`; core keeps no
//!   global config state.

use crate::logging::default_log_level;
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "TASKDECK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TASKDECK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TASKDECK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "taskdeck.sqlite3";
const MEMORY_DB_MARKER: &str = ":memory:";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Physical location of the task database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl DbLocation {
    /// Short label used in log events.
    pub fn mode_label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Settings used to open the task store and start logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db: DbLocation,
    /// SQLite busy timeout applied to the store connection.
    pub busy_timeout: Duration,
    pub log_level: String,
    /// Absolute log directory. `None` leaves logging disabled.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db: DbLocation::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// In-memory configuration, mainly for tests and smoke runs.
    pub fn in_memory() -> Self {
        Self {
            db: DbLocation::Memory,
            ..Self::default()
        }
    }

    /// Resolves configuration from `TASKDECK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(db_path) = read(DB_PATH_ENV) {
            config.db = if db_path == MEMORY_DB_MARKER {
                DbLocation::Memory
            } else {
                DbLocation::File(PathBuf::from(db_path))
            };
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        config.log_dir = read(LOG_DIR_ENV);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DbLocation, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config, CoreConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn memory_marker_selects_in_memory_db() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, " :memory: ")]));
        assert_eq!(config.db, DbLocation::Memory);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "/var/lib/taskdeck/tasks.db"),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/taskdeck"),
        ]));
        assert_eq!(
            config.db,
            DbLocation::File(PathBuf::from("/var/lib/taskdeck/tasks.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/taskdeck"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "  "), (LOG_DIR_ENV, "")]));
        assert_eq!(config.db, CoreConfig::default().db);
        assert!(config.log_dir.is_none());
    }
}
