use rusqlite::Connection;
use taskdeck_core::db::migrations::{current_user_version, latest_version, migrate_to};
use taskdeck_core::db::{open_db, open_db_in_memory, DbError};
use taskdeck_core::{CoreConfig, DbLocation, RepoError, StoreError, TaskStore};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(latest_version(), 2);
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
    assert_eq!(
        column_names(&conn),
        vec!["id", "title", "description", "priority", "dueDate", "isCompleted", "order"]
    );
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskdeck.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO tasks (title, priority, dueDate) VALUES ('kept', 'LOW', 1);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_eq!(row_count(&conn_second), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn version_one_schema_has_no_order_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    migrate_to(&mut conn, 1).unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), 1);
    assert!(!column_names(&conn).contains(&"order".to_string()));
}

#[test]
fn migration_one_to_two_preserves_rows_and_defaults_order_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let mut legacy = Connection::open(&path).unwrap();
    migrate_to(&mut legacy, 1).unwrap();
    legacy
        .execute_batch(
            "INSERT INTO tasks (title, description, priority, dueDate, isCompleted)
             VALUES ('Buy milk', NULL, 'LOW', 1000, 0);
             INSERT INTO tasks (title, description, priority, dueDate, isCompleted)
             VALUES ('File taxes', 'before april', 'HIGH', 2000, 1);
             INSERT INTO tasks (title, description, priority, dueDate, isCompleted)
             VALUES ('Call mom', 'sunday', 'MEDIUM', 1500, 0);",
        )
        .unwrap();
    let before = legacy_rows(&legacy);
    drop(legacy);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), 2);
    assert_eq!(row_count(&conn), 3);

    let after = legacy_rows(&conn);
    assert_eq!(after, before);

    let orders: Vec<i64> = conn
        .prepare("SELECT `order` FROM tasks ORDER BY id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(orders, vec![0, 0, 0]);
}

#[test]
fn failed_migration_aborts_open_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");

    let mut legacy = Connection::open(&path).unwrap();
    migrate_to(&mut legacy, 1).unwrap();
    legacy
        .execute_batch(
            "INSERT INTO tasks (title, priority, dueDate) VALUES ('survivor', 'HIGH', 5);
             ALTER TABLE tasks ADD COLUMN `order` INTEGER NOT NULL DEFAULT 7;",
        )
        .unwrap();
    drop(legacy);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Migration { version: 2, .. }), "{err}");

    let raw = Connection::open(&path).unwrap();
    assert_eq!(current_user_version(&raw).unwrap(), 1);
    assert_eq!(row_count(&raw), 1);
}

#[tokio::test]
async fn store_open_fails_when_migration_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken-store.db");

    let mut legacy = Connection::open(&path).unwrap();
    migrate_to(&mut legacy, 1).unwrap();
    legacy
        .execute_batch("ALTER TABLE tasks ADD COLUMN `order` INTEGER;")
        .unwrap();
    drop(legacy);

    let config = CoreConfig {
        db: DbLocation::File(path),
        ..CoreConfig::default()
    };
    let err = TaskStore::open(&config).await.err().unwrap();
    assert!(matches!(
        err,
        StoreError::Repo(RepoError::Db(DbError::Migration { version: 2, .. }))
    ));
}

type LegacyRow = (i64, String, Option<String>, String, i64, i64);

fn legacy_rows(conn: &Connection) -> Vec<LegacyRow> {
    conn.prepare(
        "SELECT id, title, description, priority, dueDate, isCompleted FROM tasks ORDER BY id;",
    )
    .unwrap()
    .query_map([], |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    })
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap()
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(tasks);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    columns
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
