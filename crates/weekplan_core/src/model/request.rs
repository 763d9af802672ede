//! Structured change requests produced by the external request handler.
//!
//! # Responsibility
//! - Describe one calendar mutation (add/move/resize/remove/adjust).
//! - Carry the optimistic-concurrency token (`expected_version`).
//!
//! # Invariants
//! - A request is consumed exactly once by the revision controller.
//! - Field presence is validated by the controller, not here.

use crate::model::interval::{Minute, TimeInterval};
use crate::model::task::{Priority, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// Mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Move,
    Resize,
    Remove,
    Adjust,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Move => "move",
            Self::Resize => "resize",
            Self::Remove => "remove",
            Self::Adjust => "adjust",
        }
    }
}

/// Partial task fields targeted by a request.
///
/// Which fields are required depends on `ChangeKind`; unset fields keep the
/// stored value on edits and fall back to defaults on add.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub id: Option<TaskId>,
    pub title: Option<String>,
    /// Desired window; the placement may land anywhere inside it.
    pub window: Option<TimeInterval>,
    pub duration: Option<Minute>,
    pub priority: Option<Priority>,
    pub flexible: Option<bool>,
    pub status: Option<TaskStatus>,
    pub color: Option<String>,
}

/// One structured mutation of the weekly calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub kind: ChangeKind,
    #[serde(default)]
    pub target: TaskDraft,
    /// Stored version the caller last observed; `Some(0)` on add asserts absence.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl ChangeRequest {
    /// Adds a task that may be placed anywhere in `window`.
    pub fn add(
        title: impl Into<String>,
        window: TimeInterval,
        duration: Minute,
        priority: Priority,
        flexible: bool,
    ) -> Self {
        Self {
            kind: ChangeKind::Add,
            target: TaskDraft {
                title: Some(title.into()),
                window: Some(window),
                duration: Some(duration),
                priority: Some(priority),
                flexible: Some(flexible),
                ..TaskDraft::default()
            },
            expected_version: None,
        }
    }

    /// Moves a task into a new desired window, keeping its duration.
    pub fn move_to(id: TaskId, window: TimeInterval) -> Self {
        Self {
            kind: ChangeKind::Move,
            target: TaskDraft {
                id: Some(id),
                window: Some(window),
                ..TaskDraft::default()
            },
            expected_version: None,
        }
    }

    /// Changes a task's duration, keeping its start.
    pub fn resize(id: TaskId, duration: Minute) -> Self {
        Self {
            kind: ChangeKind::Resize,
            target: TaskDraft {
                id: Some(id),
                duration: Some(duration),
                ..TaskDraft::default()
            },
            expected_version: None,
        }
    }

    pub fn remove(id: TaskId) -> Self {
        Self {
            kind: ChangeKind::Remove,
            target: TaskDraft {
                id: Some(id),
                ..TaskDraft::default()
            },
            expected_version: None,
        }
    }

    /// Patches any subset of `draft` onto an existing task.
    pub fn adjust(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            kind: ChangeKind::Adjust,
            target: TaskDraft {
                id: Some(id),
                ..draft
            },
            expected_version: None,
        }
    }

    /// Pins the request to the task's caller-observed version.
    pub fn expecting(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }

    /// Uses a caller-chosen id (import paths, idempotent adds).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.target.id = Some(id);
        self
    }
}
