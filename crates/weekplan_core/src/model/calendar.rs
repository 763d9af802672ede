//! Week-level calendar snapshot.
//!
//! # Responsibility
//! - Hold an immutable, start-ordered view of every task in one week.
//! - Serve read-side projections (day view, title lookup, conflict audit).
//!
//! # Invariants
//! - Tasks are sorted by `(interval.start, id)`.
//! - A calendar produced by a commit is conflict-free; a calendar built from
//!   external data may not be, and `conflicts()` reports that.

use crate::model::interval::{TimeInterval, Weekday};
use crate::model::task::{Task, TaskId};
use crate::schedule::conflict::{sweep_overlaps, OverlapPair};
use serde::{Deserialize, Serialize};
use similar::TextDiff;

/// Minimum title similarity accepted by `find_similar` callers by default.
pub const DEFAULT_TITLE_SIMILARITY: f32 = 0.6;

/// Ordered set of tasks for a single week.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "CalendarRecord")]
pub struct Calendar {
    tasks: Vec<Task>,
}

/// Wire shape; decoding re-sorts so external data keeps the start order.
#[derive(Deserialize)]
struct CalendarRecord {
    #[serde(default)]
    tasks: Vec<Task>,
}

impl From<CalendarRecord> for Calendar {
    fn from(value: CalendarRecord) -> Self {
        Self::from_tasks(value.tasks)
    }
}

impl Calendar {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a calendar, sorting tasks by start time.
    pub fn from_tasks(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|task| (task.interval.start(), task.id));
        Self { tasks }
    }

    /// Wraps tasks already in `(start, id)` order.
    pub(crate) fn from_ordered(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks starting on `day`, in start order.
    pub fn tasks_on(&self, day: Weekday) -> Vec<&Task> {
        let span = TimeInterval::day_span(day);
        self.tasks
            .iter()
            .filter(|task| span.contains(task.interval.start()))
            .collect()
    }

    /// Case-insensitive exact title match, in start order.
    pub fn find_by_title(&self, title: &str) -> Vec<&Task> {
        let needle = title.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|task| task.title.trim().to_lowercase() == needle)
            .collect()
    }

    /// Tasks whose title scores at least `threshold` against `title`,
    /// best match first; ties keep start order.
    ///
    /// Scores are character-level similarity ratios in `[0, 1]`, compared
    /// case-insensitively.
    pub fn find_similar(&self, title: &str, threshold: f32) -> Vec<(&Task, f32)> {
        let needle = title.trim().to_lowercase();
        let mut matches: Vec<(&Task, f32)> = self
            .tasks
            .iter()
            .map(|task| (task, title_similarity(&needle, &task.title)))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        matches.sort_by(|a, b| b.1.total_cmp(&a.1));
        matches
    }

    /// Every overlapping pair, found with a start-ordered sweep.
    pub fn conflicts(&self) -> Vec<OverlapPair> {
        sweep_overlaps(&self.tasks)
    }

    pub fn is_conflict_free(&self) -> bool {
        self.conflicts().is_empty()
    }
}

fn title_similarity(needle: &str, title: &str) -> f32 {
    let candidate = title.trim().to_lowercase();
    TextDiff::from_chars(needle, candidate.as_str()).ratio()
}

impl IntoIterator for Calendar {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl<'a> IntoIterator for &'a Calendar {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
