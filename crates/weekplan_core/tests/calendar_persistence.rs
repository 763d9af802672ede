use rusqlite::Connection;
use weekplan_core::db::migrations::latest_version;
use weekplan_core::db::{open_db, open_db_in_memory, DbError};
use weekplan_core::{
    Calendar, CalendarRepository, ChangeRequest, EngineConfig, Priority, RepoError,
    RevisionController, SqliteCalendarRepository, TaskDraft, TaskStatus, TimeInterval, Weekday,
};

fn sample_calendar() -> Calendar {
    let mut controller = RevisionController::new(&EngineConfig::default());
    let tue = |from, to| TimeInterval::on(Weekday::Tue, from, to).unwrap();
    assert!(controller
        .submit(ChangeRequest::add(
            "Math study",
            tue((14, 0), (17, 0)),
            180,
            Priority::High,
            false,
        ))
        .accepted);
    assert!(controller
        .submit(ChangeRequest::add(
            "Grocery shopping",
            tue((14, 0), (18, 0)),
            60,
            Priority::Low,
            true,
        ))
        .accepted);
    let grocery_id = controller.snapshot().find_by_title("Grocery shopping")[0].id;
    assert!(controller
        .submit(ChangeRequest::adjust(
            grocery_id,
            TaskDraft {
                status: Some(TaskStatus::Completed),
                color: Some("#ff8800".to_string()),
                ..TaskDraft::default()
            },
        ))
        .accepted);
    controller.snapshot()
}

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "scheduled_tasks");
    assert_table_exists(&conn, "calendar_meta");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekplan.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn saved_calendar_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("week.db");
    let calendar = sample_calendar();

    {
        let mut conn = open_db(&path).unwrap();
        let mut repo = SqliteCalendarRepository::new(&mut conn);
        assert_eq!(repo.last_saved_at().unwrap(), None);
        repo.save_calendar(&calendar).unwrap();
        assert!(repo.last_saved_at().unwrap().is_some());
    }

    let mut conn = open_db(&path).unwrap();
    let loaded = SqliteCalendarRepository::new(&mut conn)
        .load_calendar()
        .unwrap();
    assert_eq!(loaded, calendar);

    let controller =
        RevisionController::with_calendar(&EngineConfig::default(), loaded).unwrap();
    assert_eq!(controller.snapshot(), calendar);
}

#[test]
fn save_replaces_the_previous_week() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCalendarRepository::new(&mut conn);
    repo.save_calendar(&sample_calendar()).unwrap();
    repo.save_calendar(&Calendar::empty()).unwrap();

    assert!(repo.load_calendar().unwrap().is_empty());
}

#[test]
fn corrupt_rows_are_reported() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO scheduled_tasks (
            id, title, start_minute, end_minute, window_start, window_end,
            priority, flexible, status, color, version
        ) VALUES ('not-a-uuid', 'Ghost', 60, 120, 60, 120, 'low', 1, 'pending', NULL, 1);",
        [],
    )
    .unwrap();

    let err = SqliteCalendarRepository::new(&mut conn)
        .load_calendar()
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn rows_violating_task_rules_are_rejected_on_load() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO scheduled_tasks (
            id, title, start_minute, end_minute, window_start, window_end,
            priority, flexible, status, color, version
        ) VALUES (?1, 'Drift', 60, 180, 60, 120, 'low', 1, 'pending', NULL, 1);",
        [uuid::Uuid::new_v4().to_string()],
    )
    .unwrap();

    let err = SqliteCalendarRepository::new(&mut conn)
        .load_calendar()
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
