//! Typed outcomes of a calendar revision.
//!
//! # Responsibility
//! - Define the error taxonomy returned to request handlers.
//! - Translate errors and displacements into ordered diagnostics.
//!
//! # Invariants
//! - `accepted == true` iff `resulting_calendar.is_some()` and `error.is_none()`.
//! - Diagnostics name tasks by id and title so callers can explain them.

use crate::model::calendar::Calendar;
use crate::model::interval::{IntervalError, TimeInterval};
use crate::model::request::ChangeKind;
use crate::model::task::{TaskId, TaskValidationError};
use crate::schedule::conflict::Conflict;
use crate::schedule::placement::{BlockReason, Blocker, Relocation};
use crate::store::task_store::StoreError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Per-request state machine stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStage {
    Received,
    Validated,
    ConflictChecked,
    Resolved,
    Committed,
    Rejected,
}

impl RevisionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::ConflictChecked => "conflict_checked",
            Self::Resolved => "resolved",
            Self::Committed => "committed",
            Self::Rejected => "rejected",
        }
    }
}

/// Why a revision was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    /// Malformed time range; never retried.
    InvalidInterval(IntervalError),
    InvalidTask(TaskValidationError),
    MissingField {
        kind: ChangeKind,
        field: &'static str,
    },
    TaskNotFound(TaskId),
    DuplicateTask(TaskId),
    /// Stale edit; the caller should refetch and retry.
    VersionConflict {
        id: TaskId,
        expected: u64,
        actual: u64,
    },
    /// Two immovable tasks collide.
    HardConflict { conflicts: Vec<Conflict> },
    /// No placement inside the desired window.
    Infeasible { blockers: Vec<Blocker> },
    /// Abandoned by the caller before validation.
    Cancelled,
    /// Loaded snapshot contains two overlapping tasks.
    SnapshotOverlap {
        first: TaskId,
        second: TaskId,
        overlap: TimeInterval,
    },
}

impl Display for RevisionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInterval(err) => write!(f, "invalid interval: {err}"),
            Self::InvalidTask(err) => write!(f, "invalid task: {err}"),
            Self::MissingField { kind, field } => {
                write!(f, "{} request requires `{field}`", kind.as_str())
            }
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateTask(id) => write!(f, "task already exists: {id}"),
            Self::VersionConflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "task {id} is at version {actual}, request expected {expected}"
            ),
            Self::HardConflict { conflicts } => {
                write!(f, "collides with {} fixed task(s)", conflicts.len())
            }
            Self::Infeasible { blockers } => write!(
                f,
                "no free slot in the desired window; {} blocking task(s)",
                blockers.len()
            ),
            Self::Cancelled => write!(f, "request cancelled before validation"),
            Self::SnapshotOverlap {
                first,
                second,
                overlap,
            } => write!(f, "snapshot tasks {first} and {second} overlap during {overlap}"),
        }
    }
}

impl Error for RevisionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInterval(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntervalError> for RevisionError {
    fn from(value: IntervalError) -> Self {
        Self::InvalidInterval(value)
    }
}

impl From<TaskValidationError> for RevisionError {
    fn from(value: TaskValidationError) -> Self {
        match value {
            TaskValidationError::Interval(err) => Self::InvalidInterval(err),
            other => Self::InvalidTask(other),
        }
    }
}

impl From<StoreError> for RevisionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => err.into(),
            StoreError::NotFound(id) => Self::TaskNotFound(id),
            StoreError::VersionConflict {
                id,
                expected,
                actual,
            } => Self::VersionConflict {
                id,
                expected,
                actual,
            },
            StoreError::DuplicateId(id) => Self::DuplicateTask(id),
        }
    }
}

impl RevisionError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::InvalidInterval(_) => DiagnosticCode::InvalidInterval,
            Self::InvalidTask(_) => DiagnosticCode::InvalidTask,
            Self::MissingField { .. } => DiagnosticCode::MissingField,
            Self::TaskNotFound(_) => DiagnosticCode::TaskNotFound,
            Self::DuplicateTask(_) => DiagnosticCode::DuplicateTask,
            Self::VersionConflict { .. } => DiagnosticCode::VersionConflict,
            Self::HardConflict { .. } => DiagnosticCode::HardConflict,
            Self::Infeasible { .. } => DiagnosticCode::Blocking,
            Self::Cancelled => DiagnosticCode::Cancelled,
            Self::SnapshotOverlap { .. } => DiagnosticCode::SnapshotOverlap,
        }
    }

    /// Expands the error into per-task diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::HardConflict { conflicts } => conflicts
                .iter()
                .map(|conflict| Diagnostic {
                    code: DiagnosticCode::HardConflict,
                    message: format!(
                        "overlaps fixed task `{}` during {}",
                        conflict.other_title, conflict.overlap
                    ),
                    task_id: Some(conflict.other_task_id),
                    task_title: Some(conflict.other_title.clone()),
                    interval: Some(conflict.overlap),
                })
                .collect(),
            Self::Infeasible { blockers } => blockers
                .iter()
                .map(|blocker| Diagnostic {
                    code: DiagnosticCode::Blocking,
                    message: format!(
                        "`{}` at {} {}",
                        blocker.title,
                        blocker.interval,
                        block_reason_text(blocker.reason)
                    ),
                    task_id: Some(blocker.task_id),
                    task_title: Some(blocker.title.clone()),
                    interval: Some(blocker.interval),
                })
                .collect(),
            Self::TaskNotFound(id) | Self::DuplicateTask(id) => vec![Diagnostic {
                task_id: Some(*id),
                ..Diagnostic::plain(self.code(), self.to_string())
            }],
            Self::VersionConflict { id, .. } => vec![Diagnostic {
                task_id: Some(*id),
                ..Diagnostic::plain(self.code(), self.to_string())
            }],
            _ => vec![Diagnostic::plain(self.code(), self.to_string())],
        }
    }
}

fn block_reason_text(reason: BlockReason) -> &'static str {
    match reason {
        BlockReason::Fixed => "is fixed",
        BlockReason::Outranks => "has equal or higher priority",
        BlockReason::NoRoomToRelocate => "could not be moved elsewhere this week",
        BlockReason::DisplacementDisabled => "occupies the window and displacement is off",
    }
}

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    InvalidInterval,
    InvalidTask,
    MissingField,
    TaskNotFound,
    DuplicateTask,
    VersionConflict,
    HardConflict,
    Blocking,
    Relocated,
    Cancelled,
    SnapshotOverlap,
}

/// One human-translatable explanation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub task_id: Option<TaskId>,
    pub task_title: Option<String>,
    pub interval: Option<TimeInterval>,
}

impl Diagnostic {
    fn plain(code: DiagnosticCode, message: String) -> Self {
        Self {
            code,
            message,
            task_id: None,
            task_title: None,
            interval: None,
        }
    }

    pub(crate) fn relocated(relocation: &Relocation) -> Self {
        Self {
            code: DiagnosticCode::Relocated,
            message: format!(
                "moved `{}` from {} to {}",
                relocation.title, relocation.from, relocation.to
            ),
            task_id: Some(relocation.task_id),
            task_title: Some(relocation.title.clone()),
            interval: Some(relocation.to),
        }
    }
}

/// Terminal result of one change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub accepted: bool,
    pub resulting_calendar: Option<Calendar>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub error: Option<RevisionError>,
    /// `Committed` or `Rejected`.
    pub final_stage: RevisionStage,
    /// Last stage reached before rejection.
    pub rejected_after: Option<RevisionStage>,
}

impl ResolutionOutcome {
    pub(crate) fn committed(calendar: Calendar, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            accepted: true,
            resulting_calendar: Some(calendar),
            diagnostics,
            error: None,
            final_stage: RevisionStage::Committed,
            rejected_after: None,
        }
    }

    pub(crate) fn rejected(after: RevisionStage, error: RevisionError) -> Self {
        Self {
            accepted: false,
            resulting_calendar: None,
            diagnostics: error.diagnostics(),
            error: Some(error),
            final_stage: RevisionStage::Rejected,
            rejected_after: Some(after),
        }
    }

    pub fn error(&self) -> Option<&RevisionError> {
        self.error.as_ref()
    }
}
