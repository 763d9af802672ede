//! Conflict detection over a start-ordered task sequence.
//!
//! # Responsibility
//! - Find every committed task overlapping a proposed placement.
//! - Classify each overlap as HARD (two fixed tasks) or SOFT.
//! - Audit a whole calendar for overlapping pairs.
//!
//! # Invariants
//! - Input must be ordered by start time; the sweep stops at the first task
//!   starting at or after the candidate's end.
//! - Detection never mutates its input.

use crate::model::interval::TimeInterval;
use crate::model::task::{Task, TaskId};
use serde::Serialize;

/// Whether the resolver may settle a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fixed vs fixed; never auto-resolved.
    Hard,
    /// At least one side may move.
    Soft,
}

/// Overlap between a candidate and one committed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub other_task_id: TaskId,
    pub other_title: String,
    pub overlap: TimeInterval,
    pub severity: Severity,
    /// Task expected to give way; meaningless for `Hard`.
    pub yielding: TaskId,
}

/// Overlapping pair found by a whole-calendar sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPair {
    pub first: TaskId,
    pub second: TaskId,
    pub overlap: TimeInterval,
}

/// Returns conflicts between `candidate` and `ordered`, in start order.
///
/// A stored task with the candidate's id is its previous placement and is
/// skipped.
pub fn detect_conflicts<'a, I>(ordered: I, candidate: &Task) -> Vec<Conflict>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut conflicts = Vec::new();
    for other in ordered {
        if other.interval.start() >= candidate.interval.end() {
            break;
        }
        if other.id == candidate.id || other.interval.end() <= candidate.interval.start() {
            continue;
        }
        if let Some(overlap) = candidate.interval.intersection(&other.interval) {
            let (severity, yielding) = classify(candidate, other);
            conflicts.push(Conflict {
                other_task_id: other.id,
                other_title: other.title.clone(),
                overlap,
                severity,
                yielding,
            });
        }
    }
    conflicts
}

/// Decides severity and which side yields.
///
/// Fixed beats flexible; otherwise lower priority yields, and on a tie the
/// incoming candidate yields.
pub fn classify(candidate: &Task, other: &Task) -> (Severity, TaskId) {
    match (candidate.is_fixed(), other.is_fixed()) {
        (true, true) => (Severity::Hard, candidate.id),
        (true, false) => (Severity::Soft, other.id),
        (false, true) => (Severity::Soft, candidate.id),
        (false, false) => {
            if other.priority < candidate.priority {
                (Severity::Soft, other.id)
            } else {
                (Severity::Soft, candidate.id)
            }
        }
    }
}

/// Finds every overlapping pair in a start-ordered slice.
///
/// Keeps an active window of tasks whose end is still after the current
/// start, so each task is compared only with tasks it could overlap.
pub fn sweep_overlaps(ordered: &[Task]) -> Vec<OverlapPair> {
    let mut pairs = Vec::new();
    let mut active: Vec<&Task> = Vec::new();
    for task in ordered {
        active.retain(|open| open.interval.end() > task.interval.start());
        for open in &active {
            if let Some(overlap) = open.interval.intersection(&task.interval) {
                pairs.push(OverlapPair {
                    first: open.id,
                    second: task.id,
                    overlap,
                });
            }
        }
        active.push(task);
    }
    pairs
}
