//! In-memory task store owned by one revision controller.
//!
//! # Responsibility
//! - Map `TaskId` to `Task` and keep a start-ordered index.
//! - Enforce optimistic concurrency via stored versions.
//! - Apply multi-task write batches atomically.
//!
//! # Invariants
//! - Every write path calls `Task::validate()` before mutation.
//! - `by_start` mirrors `tasks` exactly.
//! - A failed `apply` leaves the store unchanged.

use crate::model::calendar::Calendar;
use crate::model::interval::Minute;
use crate::model::task::{Task, TaskId, TaskValidationError};
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Task store failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(TaskValidationError),
    NotFound(TaskId),
    /// Caller's expected version does not match the stored one (0 = absent).
    VersionConflict {
        id: TaskId,
        expected: u64,
        actual: u64,
    },
    /// Bulk load contained the same id twice.
    DuplicateId(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::VersionConflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "version conflict on task {id}: expected {expected}, stored {actual}"
            ),
            Self::DuplicateId(id) => write!(f, "duplicate task id: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Put {
        task: Task,
        expected_version: Option<u64>,
    },
    Remove {
        id: TaskId,
        expected_version: Option<u64>,
    },
}

/// Task storage keyed by id with a start-time index.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: HashMap<TaskId, Task>,
    by_start: BTreeSet<(Minute, TaskId)>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Current stored version, 0 when absent.
    pub fn version_of(&self, id: TaskId) -> u64 {
        self.tasks.get(&id).map_or(0, |task| task.version)
    }

    /// Inserts or updates a task, returning its new version.
    ///
    /// # Errors
    /// - `VersionConflict` when `expected_version` is set and differs from
    ///   the stored version (absent tasks count as version 0).
    /// - `Validation` when the task breaks a model invariant.
    pub fn put(&mut self, mut task: Task, expected_version: Option<u64>) -> StoreResult<u64> {
        task.validate()?;
        let current = self.version_of(task.id);
        check_version(task.id, expected_version, current)?;

        if let Some(previous) = self.tasks.get(&task.id) {
            self.by_start.remove(&(previous.interval.start(), previous.id));
        }
        task.version = current + 1;
        let version = task.version;
        self.by_start.insert((task.interval.start(), task.id));
        self.tasks.insert(task.id, task);
        Ok(version)
    }

    /// Removes a task, returning its last stored state.
    pub fn remove(&mut self, id: TaskId, expected_version: Option<u64>) -> StoreResult<Task> {
        let current = self.tasks.get(&id).ok_or(StoreError::NotFound(id))?.version;
        check_version(id, expected_version, current)?;
        let removed = self.tasks.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.by_start.remove(&(removed.interval.start(), removed.id));
        Ok(removed)
    }

    /// Fresh start-ordered snapshot; later writes never show through it.
    pub fn all_ordered_by_start(&self) -> Calendar {
        let tasks = self
            .by_start
            .iter()
            .filter_map(|(_, id)| self.tasks.get(id).cloned())
            .collect();
        Calendar::from_ordered(tasks)
    }

    /// Applies every op or none of them.
    ///
    /// Returns the stored state of each `Put` in batch order.
    pub fn apply(&mut self, ops: Vec<StoreOp>) -> StoreResult<Vec<Task>> {
        let mut staged = self.clone();
        let mut written = Vec::new();
        for op in ops {
            match op {
                StoreOp::Put {
                    task,
                    expected_version,
                } => {
                    let id = task.id;
                    staged.put(task, expected_version)?;
                    if let Some(stored) = staged.get(id) {
                        written.push(stored.clone());
                    }
                }
                StoreOp::Remove {
                    id,
                    expected_version,
                } => {
                    staged.remove(id, expected_version)?;
                }
            }
        }
        debug!(
            "event=store_apply module=store status=ok writes={} size={}",
            written.len(),
            staged.len()
        );
        *self = staged;
        Ok(written)
    }

    /// Replaces all contents with previously committed tasks, keeping versions.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> StoreResult<()> {
        let mut fresh = TaskStore::new();
        for task in tasks {
            task.validate()?;
            if fresh.tasks.contains_key(&task.id) {
                return Err(StoreError::DuplicateId(task.id));
            }
            fresh.by_start.insert((task.interval.start(), task.id));
            fresh.tasks.insert(task.id, task);
        }
        *self = fresh;
        Ok(())
    }
}

fn check_version(id: TaskId, expected: Option<u64>, actual: u64) -> StoreResult<()> {
    match expected {
        Some(expected) if expected != actual => Err(StoreError::VersionConflict {
            id,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
