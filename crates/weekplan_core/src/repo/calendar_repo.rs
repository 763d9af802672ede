//! Calendar snapshot repository and SQLite implementation.
//!
//! # Responsibility
//! - Persist and restore whole-week snapshots for the persistence collaborator.
//! - Keep SQL details out of the scheduling core.
//!
//! # Invariants
//! - `save_calendar` replaces the stored week in one transaction.
//! - Loaded rows are re-validated; corrupt rows are reported, not masked.
//! - Round trip preserves ids, intervals, windows, versions, status and color.

use crate::db::DbError;
use crate::model::calendar::Calendar;
use crate::model::interval::{IntervalError, TimeInterval};
use crate::model::task::{Priority, Task, TaskStatus, TaskValidationError};
use log::info;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    start_minute,
    end_minute,
    window_start,
    window_end,
    priority,
    flexible,
    status,
    color,
    version
FROM scheduled_tasks";

const SAVED_AT_KEY: &str = "saved_at_ms";

pub type RepoResult<T> = Result<T, RepoError>;

/// Snapshot persistence failure.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Validation(TaskValidationError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
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

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IntervalError> for RepoError {
    fn from(value: IntervalError) -> Self {
        Self::Validation(TaskValidationError::Interval(value))
    }
}

/// Storage contract for whole-week snapshots.
pub trait CalendarRepository {
    fn save_calendar(&mut self, calendar: &Calendar) -> RepoResult<()>;
    fn load_calendar(&self) -> RepoResult<Calendar>;
    /// Epoch milliseconds of the last save, if any.
    fn last_saved_at(&self) -> RepoResult<Option<i64>>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl CalendarRepository for SqliteCalendarRepository<'_> {
    fn save_calendar(&mut self, calendar: &Calendar) -> RepoResult<()> {
        for task in calendar {
            task.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM scheduled_tasks;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO scheduled_tasks (
                    id,
                    title,
                    start_minute,
                    end_minute,
                    window_start,
                    window_end,
                    priority,
                    flexible,
                    status,
                    color,
                    version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            )?;
            for task in calendar {
                insert.execute(params![
                    task.id.to_string(),
                    task.title.as_str(),
                    task.interval.start(),
                    task.interval.end(),
                    task.window.start(),
                    task.window.end(),
                    priority_to_db(task.priority),
                    i64::from(task.flexible),
                    status_to_db(task.status),
                    task.color.as_deref(),
                    i64::try_from(task.version).map_err(|_| {
                        RepoError::InvalidData(format!("version {} exceeds i64", task.version))
                    })?,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO calendar_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![SAVED_AT_KEY, now_epoch_ms().to_string()],
        )?;
        tx.commit()?;

        info!(
            "event=calendar_save module=repo status=ok tasks={}",
            calendar.len()
        );
        Ok(())
    }

    fn load_calendar(&self) -> RepoResult<Calendar> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY start_minute ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        info!(
            "event=calendar_load module=repo status=ok tasks={}",
            tasks.len()
        );
        Ok(Calendar::from_tasks(tasks))
    }

    fn last_saved_at(&self) -> RepoResult<Option<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM calendar_meta WHERE key = ?1;")?;
        let mut rows = stmt.query([SAVED_AT_KEY])?;
        match rows.next()? {
            Some(row) => {
                let value: String = row.get(0)?;
                value.parse::<i64>().map(Some).map_err(|_| {
                    RepoError::InvalidData(format!("invalid saved_at value `{value}`"))
                })
            }
            None => Ok(None),
        }
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{id_text}` in scheduled_tasks.id"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid priority `{priority_text}`"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid status `{status_text}`")))?;

    let flexible = match row.get::<_, i64>("flexible")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid flexible value `{other}`"
            )))
        }
    };

    let version: i64 = row.get("version")?;
    let version = u64::try_from(version)
        .map_err(|_| RepoError::InvalidData(format!("negative version `{version}`")))?;

    let task = Task {
        id,
        title: row.get("title")?,
        interval: TimeInterval::new(row.get("start_minute")?, row.get("end_minute")?)?,
        window: TimeInterval::new(row.get("window_start")?, row.get("window_end")?)?,
        priority,
        flexible,
        status,
        color: row.get("color")?,
        version,
    };
    task.validate()?;
    Ok(task)
}

fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
        Priority::Fixed => "fixed",
    }
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "low" => Some(Priority::Low),
        "medium" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        "fixed" => Some(Priority::Fixed),
        _ => None,
    }
}

fn status_to_db(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    }
}

fn parse_status(value: &str) -> Option<TaskStatus> {
    match value {
        "pending" => Some(TaskStatus::Pending),
        "completed" => Some(TaskStatus::Completed),
        _ => None,
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
