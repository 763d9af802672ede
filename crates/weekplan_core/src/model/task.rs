//! Task domain model.
//!
//! # Responsibility
//! - Define the scheduled unit placed on the weekly calendar.
//! - Validate structural invariants before a task enters the store.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `interval` lies inside `window`, and both lie inside the planning week.
//! - `priority == Fixed` implies `flexible == false`.
//! - `version >= 1` once the task has been committed.

use crate::model::interval::{IntervalError, TimeInterval};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

const MAX_TITLE_CHARS: usize = 200;

/// Stable identifier for every scheduled task.
pub type TaskId = Uuid;

/// Ordered priority; later variants win conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Fixed,
}

/// Completion state carried along with the placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Task-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    BlankTitle,
    TitleTooLong { chars: usize },
    Interval(IntervalError),
    /// Placement falls outside the desired window.
    IntervalOutsideWindow {
        interval: TimeInterval,
        window: TimeInterval,
    },
    /// `priority == Fixed` combined with `flexible == true`.
    FlexibleFixedPriority,
    InvalidColor(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::TitleTooLong { chars } => write!(
                f,
                "task title has {chars} chars; at most {MAX_TITLE_CHARS} allowed"
            ),
            Self::Interval(err) => write!(f, "{err}"),
            Self::IntervalOutsideWindow { interval, window } => write!(
                f,
                "task interval {interval} must lie inside desired window {window}"
            ),
            Self::FlexibleFixedPriority => {
                write!(f, "tasks with priority `fixed` cannot be flexible")
            }
            Self::InvalidColor(value) => {
                write!(f, "invalid color `{value}`; expected #RRGGBB")
            }
        }
    }
}

impl Error for TaskValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Interval(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntervalError> for TaskValidationError {
    fn from(value: IntervalError) -> Self {
        Self::Interval(value)
    }
}

/// One placed task on the weekly calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Actual placement.
    pub interval: TimeInterval,
    /// Range the placement may vary within; always contains `interval`.
    pub window: TimeInterval,
    pub priority: Priority,
    pub flexible: bool,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub color: Option<String>,
    /// Bumped on every committed mutation; 0 means never committed.
    #[serde(default)]
    pub version: u64,
}

#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    title: String,
    interval: TimeInterval,
    window: TimeInterval,
    priority: Priority,
    flexible: bool,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    version: u64,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        let task = Task {
            id: value.id,
            title: value.title,
            interval: value.interval,
            window: value.window,
            priority: value.priority,
            flexible: value.flexible,
            status: value.status,
            color: value.color,
            version: value.version,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates an uncommitted task whose window equals its interval.
    pub fn new(
        title: impl Into<String>,
        interval: TimeInterval,
        priority: Priority,
        flexible: bool,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), title, interval, priority, flexible)
    }

    /// Creates an uncommitted task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: TaskId,
        title: impl Into<String>,
        interval: TimeInterval,
        priority: Priority,
        flexible: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            interval,
            window: interval,
            priority,
            flexible,
            status: TaskStatus::Pending,
            color: None,
            version: 0,
        }
    }

    /// Replaces the desired window, keeping the current placement.
    pub fn in_window(mut self, window: TimeInterval) -> Self {
        self.window = window;
        self
    }

    /// Fixed tasks are immovable by the resolver.
    pub fn is_fixed(&self) -> bool {
        !self.flexible || self.priority == Priority::Fixed
    }

    /// Priority used in conflict arbitration; fixed tasks rank highest.
    pub fn effective_priority(&self) -> Priority {
        if self.is_fixed() {
            Priority::Fixed
        } else {
            self.priority
        }
    }

    pub fn duration(&self) -> i64 {
        self.interval.duration()
    }

    /// Checks every structural invariant of a task.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        let chars = title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(TaskValidationError::TitleTooLong { chars });
        }
        self.interval.ensure_in_week()?;
        self.window.ensure_in_week()?;
        if !self.interval.within(&self.window) {
            return Err(TaskValidationError::IntervalOutsideWindow {
                interval: self.interval,
                window: self.window,
            });
        }
        if self.priority == Priority::Fixed && self.flexible {
            return Err(TaskValidationError::FlexibleFixedPriority);
        }
        if let Some(color) = &self.color {
            if !HEX_COLOR_RE.is_match(color) {
                return Err(TaskValidationError::InvalidColor(color.clone()));
            }
        }
        Ok(())
    }
}

/// Trims and checks a user-facing title.
pub fn normalize_title(value: &str) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Priority, Task, TaskValidationError};
    use crate::model::interval::{TimeInterval, Weekday};

    #[test]
    fn inflexible_task_ranks_as_fixed() {
        let interval = TimeInterval::on(Weekday::Mon, (9, 0), (10, 0)).unwrap();
        let task = Task::new("standup", interval, Priority::High, false);
        assert!(task.is_fixed());
        assert_eq!(task.effective_priority(), Priority::Fixed);
    }

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        assert_eq!(normalize_title("  gym ").unwrap(), "gym");
        assert_eq!(
            normalize_title(" \t").unwrap_err(),
            TaskValidationError::BlankTitle
        );
    }
}
