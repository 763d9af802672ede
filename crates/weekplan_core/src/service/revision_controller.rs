//! Calendar revision controller.
//!
//! # Responsibility
//! - Run each change request through validate -> detect -> resolve -> commit.
//! - Own the week's task store; expose snapshot and load for collaborators.
//!
//! # Invariants
//! - Requests are processed one at a time (`&mut self`).
//! - Every store write of one request goes through a single atomic batch;
//!   a rejected request leaves the store byte-for-byte unchanged.
//! - Committed calendars are conflict-free.
//! - Fixed tasks only change through their own explicit request.

use crate::config::EngineConfig;
use crate::model::calendar::Calendar;
use crate::model::interval::TimeInterval;
use crate::model::request::{ChangeKind, ChangeRequest, TaskDraft};
use crate::model::task::{normalize_title, Priority, Task, TaskId};
use crate::schedule::conflict::{detect_conflicts, Severity};
use crate::schedule::placement::PlacementResolver;
use crate::service::outcome::{Diagnostic, ResolutionOutcome, RevisionError, RevisionStage};
use crate::store::task_store::{StoreOp, TaskStore};
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

/// Validated intent of one request.
#[derive(Debug)]
enum Proposal {
    Place {
        candidate: Task,
        expected_version: Option<u64>,
    },
    Remove {
        id: TaskId,
        expected_version: Option<u64>,
    },
}

/// Single owner of one week's calendar.
pub struct RevisionController {
    store: TaskStore,
    resolver: PlacementResolver,
}

impl RevisionController {
    /// Creates a controller over an empty week.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            store: TaskStore::new(),
            resolver: PlacementResolver::from_config(config),
        }
    }

    /// Creates a controller initialised from a persisted snapshot.
    pub fn with_calendar(config: &EngineConfig, calendar: Calendar) -> Result<Self, RevisionError> {
        let mut controller = Self::new(config);
        controller.load(calendar)?;
        Ok(controller)
    }

    /// Read-only copy of the current week, ordered by start.
    pub fn snapshot(&self) -> Calendar {
        self.store.all_ordered_by_start()
    }

    /// Replaces the whole week with a previously persisted snapshot.
    ///
    /// Versions are kept as stored. Rejects invalid tasks, duplicate ids and
    /// overlapping tasks without touching the current state.
    pub fn load(&mut self, calendar: Calendar) -> Result<(), RevisionError> {
        let calendar = Calendar::from_tasks(calendar.into_tasks());
        if let Some(pair) = calendar.conflicts().into_iter().next() {
            warn!("event=calendar_load module=revision status=error error_code=snapshot_overlap");
            return Err(RevisionError::SnapshotOverlap {
                first: pair.first,
                second: pair.second,
                overlap: pair.overlap,
            });
        }
        self.store.replace_all(calendar.into_tasks())?;
        info!(
            "event=calendar_load module=revision status=ok tasks={}",
            self.store.len()
        );
        Ok(())
    }

    /// Applies one change request as a single transaction.
    pub fn submit(&mut self, request: ChangeRequest) -> ResolutionOutcome {
        self.submit_unless(request, || false)
    }

    /// Like `submit`, but abandons the request if `cancelled()` reports true
    /// before validation starts.
    pub fn submit_unless<F>(&mut self, request: ChangeRequest, cancelled: F) -> ResolutionOutcome
    where
        F: FnOnce() -> bool,
    {
        let started_at = Instant::now();
        let kind = request.kind;
        info!(
            "event=revision_submit module=revision status=start kind={}",
            kind.as_str()
        );

        let outcome = if cancelled() {
            ResolutionOutcome::rejected(RevisionStage::Received, RevisionError::Cancelled)
        } else {
            self.run(request)
        };

        match outcome.error() {
            None => info!(
                "event=revision_submit module=revision status=ok kind={} stage={} relocated={} duration_ms={}",
                kind.as_str(),
                outcome.final_stage.as_str(),
                outcome.diagnostics.len(),
                started_at.elapsed().as_millis()
            ),
            Some(err) => info!(
                "event=revision_submit module=revision status=rejected kind={} after={} error_code={:?} duration_ms={}",
                kind.as_str(),
                outcome
                    .rejected_after
                    .map_or("unknown", RevisionStage::as_str),
                err.code(),
                started_at.elapsed().as_millis()
            ),
        }
        outcome
    }

    fn run(&mut self, request: ChangeRequest) -> ResolutionOutcome {
        let proposal = match self.validate(&request) {
            Ok(proposal) => proposal,
            Err(err) => return ResolutionOutcome::rejected(RevisionStage::Received, err),
        };
        trace_stage(RevisionStage::Validated);

        let (candidate, expected_version) = match proposal {
            Proposal::Remove {
                id,
                expected_version,
            } => {
                let ops = vec![StoreOp::Remove {
                    id,
                    expected_version,
                }];
                return self.commit(RevisionStage::Validated, ops, Vec::new());
            }
            Proposal::Place {
                candidate,
                expected_version,
            } => (candidate, expected_version),
        };

        let snapshot = self.store.all_ordered_by_start();
        let conflicts = detect_conflicts(&snapshot, &candidate);
        trace_stage(RevisionStage::ConflictChecked);

        if conflicts.is_empty() {
            let ops = vec![StoreOp::Put {
                task: candidate,
                expected_version,
            }];
            return self.commit(RevisionStage::ConflictChecked, ops, Vec::new());
        }

        let hard: Vec<_> = conflicts
            .into_iter()
            .filter(|conflict| conflict.severity == Severity::Hard)
            .collect();
        if !hard.is_empty() {
            return ResolutionOutcome::rejected(
                RevisionStage::ConflictChecked,
                RevisionError::HardConflict { conflicts: hard },
            );
        }

        let placement = match self.resolver.resolve(&snapshot, &candidate) {
            Ok(placement) => placement,
            Err(blockers) => {
                return ResolutionOutcome::rejected(
                    RevisionStage::ConflictChecked,
                    RevisionError::Infeasible { blockers },
                )
            }
        };
        trace_stage(RevisionStage::Resolved);

        let diagnostics = placement
            .relocations
            .iter()
            .map(Diagnostic::relocated)
            .collect();
        let mut ops = vec![StoreOp::Put {
            task: placement.candidate,
            expected_version,
        }];
        ops.extend(placement.displaced.into_iter().map(|task| {
            let expected_version = Some(task.version);
            StoreOp::Put {
                task,
                expected_version,
            }
        }));
        self.commit(RevisionStage::Resolved, ops, diagnostics)
    }

    fn commit(
        &mut self,
        stage: RevisionStage,
        ops: Vec<StoreOp>,
        diagnostics: Vec<Diagnostic>,
    ) -> ResolutionOutcome {
        match self.store.apply(ops) {
            Ok(_) => ResolutionOutcome::committed(self.snapshot(), diagnostics),
            Err(err) => ResolutionOutcome::rejected(stage, err.into()),
        }
    }

    fn validate(&self, request: &ChangeRequest) -> Result<Proposal, RevisionError> {
        let draft = &request.target;
        let expected_version = request.expected_version;
        let candidate = match request.kind {
            ChangeKind::Add => self.validate_add(draft, expected_version)?,
            ChangeKind::Move => {
                let current = self.existing(ChangeKind::Move, draft, expected_version)?;
                let window = required(ChangeKind::Move, "window", draft.window)?;
                window.ensure_in_week()?;
                let duration = draft.duration.unwrap_or_else(|| current.duration());
                let interval = TimeInterval::starting_at(window.start(), duration)?;
                placed(current.clone(), interval, window)
            }
            ChangeKind::Resize => {
                let current = self.existing(ChangeKind::Resize, draft, expected_version)?;
                let duration = required(ChangeKind::Resize, "duration", draft.duration)?;
                let interval = TimeInterval::starting_at(current.interval.start(), duration)?;
                let window = draft
                    .window
                    .unwrap_or_else(|| current.window.span(&interval));
                placed(current.clone(), interval, window)
            }
            ChangeKind::Remove => {
                let current = self.existing(ChangeKind::Remove, draft, expected_version)?;
                return Ok(Proposal::Remove {
                    id: current.id,
                    expected_version,
                });
            }
            ChangeKind::Adjust => {
                let current = self.existing(ChangeKind::Adjust, draft, expected_version)?;
                adjusted(current, draft)?
            }
        };

        candidate.validate()?;
        Ok(Proposal::Place {
            candidate,
            expected_version,
        })
    }

    fn validate_add(
        &self,
        draft: &TaskDraft,
        expected_version: Option<u64>,
    ) -> Result<Task, RevisionError> {
        let title = required(ChangeKind::Add, "title", draft.title.as_deref())?;
        let title = normalize_title(title)?;
        let window = required(ChangeKind::Add, "window", draft.window)?;
        window.ensure_in_week()?;

        // A versioned ADD must name its id.
        let id = match (draft.id, expected_version) {
            (Some(id), _) => id,
            (None, None) => Uuid::new_v4(),
            (None, Some(_)) => {
                return Err(RevisionError::MissingField {
                    kind: ChangeKind::Add,
                    field: "id",
                })
            }
        };
        let actual = self.store.version_of(id);
        match expected_version {
            Some(expected) if expected != actual => {
                return Err(RevisionError::VersionConflict {
                    id,
                    expected,
                    actual,
                })
            }
            None if actual != 0 => return Err(RevisionError::DuplicateTask(id)),
            _ => {}
        }

        let duration = draft.duration.unwrap_or_else(|| window.duration());
        let interval = TimeInterval::starting_at(window.start(), duration)?;
        let priority = draft.priority.unwrap_or(Priority::Medium);
        let flexible = draft.flexible.unwrap_or(priority != Priority::Fixed);

        let mut task = Task::with_id(id, title, interval, priority, flexible);
        task.status = draft.status.unwrap_or_default();
        task.color = draft.color.clone();
        Ok(placed(task, interval, window))
    }

    /// Looks up the request's target and checks its expected version.
    fn existing(
        &self,
        kind: ChangeKind,
        draft: &TaskDraft,
        expected_version: Option<u64>,
    ) -> Result<&Task, RevisionError> {
        let id = required(kind, "id", draft.id)?;
        let current = self
            .store
            .get(id)
            .ok_or(RevisionError::TaskNotFound(id))?;
        if let Some(expected) = expected_version {
            if expected != current.version {
                return Err(RevisionError::VersionConflict {
                    id,
                    expected,
                    actual: current.version,
                });
            }
        }
        Ok(current)
    }
}

fn required<T>(kind: ChangeKind, field: &'static str, value: Option<T>) -> Result<T, RevisionError> {
    value.ok_or(RevisionError::MissingField { kind, field })
}

/// Sets placement and window; a fixed task's window is its interval.
fn placed(mut task: Task, interval: TimeInterval, window: TimeInterval) -> Task {
    task.interval = interval;
    let window = if task.is_fixed() { interval } else { window };
    task.in_window(window)
}

fn adjusted(current: &Task, draft: &TaskDraft) -> Result<Task, RevisionError> {
    let mut task = current.clone();
    if let Some(title) = draft.title.as_deref() {
        task.title = normalize_title(title)?;
    }
    if let Some(priority) = draft.priority {
        task.priority = priority;
        if priority == Priority::Fixed && draft.flexible.is_none() {
            task.flexible = false;
        }
    }
    if let Some(flexible) = draft.flexible {
        task.flexible = flexible;
    }
    if let Some(status) = draft.status {
        task.status = status;
    }
    if let Some(color) = &draft.color {
        task.color = Some(color.clone());
    }

    let (interval, window) = match (draft.window, draft.duration) {
        (None, None) => (task.interval, task.window),
        (Some(window), duration) => {
            window.ensure_in_week()?;
            let duration = duration.unwrap_or_else(|| task.duration());
            (TimeInterval::starting_at(window.start(), duration)?, window)
        }
        (None, Some(duration)) => {
            let interval = TimeInterval::starting_at(task.interval.start(), duration)?;
            (interval, task.window.span(&interval))
        }
    };
    Ok(placed(task, interval, window))
}

fn trace_stage(stage: RevisionStage) {
    debug!(
        "event=revision_stage module=revision stage={}",
        stage.as_str()
    );
}
