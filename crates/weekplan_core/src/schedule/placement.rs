//! Placement resolver: finds a conflict-free slot for a candidate task.
//!
//! # Responsibility
//! - Place a candidate inside its desired window, first-fit in time order.
//! - Displace lower-priority flexible neighbours one level deep when no
//!   free slot exists.
//! - Report the blocking tasks when no placement is possible.
//!
//! # Invariants
//! - Fixed tasks are never moved; a fixed candidate keeps its interval.
//! - Displaced neighbours only move into free space (depth 1, no cascades).
//! - Resolution is pure: the caller commits the returned placement.
//! - Free space separated by an obstacle is never combined.

use crate::config::{DayHours, EngineConfig};
use crate::model::calendar::Calendar;
use crate::model::interval::{free_subintervals, TimeInterval, Weekday};
use crate::model::task::{Task, TaskId};
use log::debug;
use serde::Serialize;

/// Accepted placement: the candidate plus every displaced neighbour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub candidate: Task,
    /// Neighbours in their new positions, in displacement order.
    pub displaced: Vec<Task>,
    pub relocations: Vec<Relocation>,
}

/// One neighbour moved to make room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub task_id: TaskId,
    pub title: String,
    pub from: TimeInterval,
    pub to: TimeInterval,
}

/// Why a task stands in the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Immovable task.
    Fixed,
    /// Flexible task of equal or higher priority.
    Outranks,
    /// Lower-priority task with no free space to move into.
    NoRoomToRelocate,
    /// Displacement is disabled by configuration.
    DisplacementDisabled,
}

/// Task that prevented placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocker {
    pub task_id: TaskId,
    pub title: String,
    pub interval: TimeInterval,
    pub reason: BlockReason,
}

/// Greedy, depth-limited placement search.
#[derive(Debug, Clone)]
pub struct PlacementResolver {
    displacement_enabled: bool,
    relocation_hours: DayHours,
}

impl PlacementResolver {
    pub fn new(displacement_enabled: bool, relocation_hours: DayHours) -> Self {
        Self {
            displacement_enabled,
            relocation_hours,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.displacement_enabled, config.relocation_hours)
    }

    /// Finds a placement for `candidate` against `snapshot`.
    ///
    /// A stored task sharing the candidate's id is its old placement and is
    /// ignored. Returns the blocking tasks, ordered by start, on failure.
    pub fn resolve(
        &self,
        snapshot: &Calendar,
        candidate: &Task,
    ) -> Result<Placement, Vec<Blocker>> {
        let others: Vec<&Task> = snapshot
            .tasks()
            .iter()
            .filter(|task| task.id != candidate.id)
            .collect();
        let window = search_window(candidate);
        let duration = candidate.duration();

        if let Some(slot) = first_fit(&window, duration, others.iter().map(|task| task.interval)) {
            debug!(
                "event=placement module=resolver status=ok mode=free_fit start={}",
                slot.start()
            );
            return Ok(Placement {
                candidate: place(candidate, slot),
                displaced: Vec::new(),
                relocations: Vec::new(),
            });
        }

        if !self.displacement_enabled {
            return Err(others
                .iter()
                .filter(|task| task.interval.overlaps(&window))
                .map(|task| blocker(task, BlockReason::DisplacementDisabled))
                .collect());
        }

        let rank = candidate.effective_priority();
        let (obstacles, movable): (Vec<&Task>, Vec<&Task>) = others
            .iter()
            .copied()
            .partition(|task| task.is_fixed() || task.effective_priority() >= rank);

        let mut stranded: Vec<&Task> = Vec::new();
        let free = free_subintervals(&window, obstacles.iter().map(|task| task.interval));
        for piece in free.iter().filter(|piece| piece.duration() >= duration) {
            for start in slot_starts(piece, duration, &movable) {
                let Ok(slot) = TimeInterval::starting_at(start, duration) else {
                    continue;
                };
                let victims: Vec<&Task> = movable
                    .iter()
                    .copied()
                    .filter(|task| task.interval.overlaps(&slot))
                    .collect();

                match self.relocate_all(&others, &victims, slot) {
                    Ok((displaced, relocations)) => {
                        debug!(
                            "event=placement module=resolver status=ok mode=displacement start={} displaced={}",
                            slot.start(),
                            displaced.len()
                        );
                        return Ok(Placement {
                            candidate: place(candidate, slot),
                            displaced,
                            relocations,
                        });
                    }
                    Err(stuck) => {
                        if !stranded.iter().any(|task| task.id == stuck.id) {
                            stranded.push(stuck);
                        }
                    }
                }
            }
        }

        debug!(
            "event=placement module=resolver status=infeasible obstacles={} stranded={}",
            obstacles.len(),
            stranded.len()
        );
        let mut blockers: Vec<(&Task, BlockReason)> = obstacles
            .iter()
            .filter(|task| task.interval.overlaps(&window))
            .map(|task| {
                let reason = if task.is_fixed() {
                    BlockReason::Fixed
                } else {
                    BlockReason::Outranks
                };
                (*task, reason)
            })
            .chain(
                stranded
                    .into_iter()
                    .map(|task| (task, BlockReason::NoRoomToRelocate)),
            )
            .collect();
        blockers.sort_by_key(|(task, _)| (task.interval.start(), task.id));
        Err(blockers
            .into_iter()
            .map(|(task, reason)| blocker(task, reason))
            .collect())
    }

    /// Moves every victim into free space outside `slot`.
    ///
    /// Returns the first victim that finds no room.
    fn relocate_all<'a>(
        &self,
        others: &[&'a Task],
        victims: &[&'a Task],
        slot: TimeInterval,
    ) -> Result<(Vec<Task>, Vec<Relocation>), &'a Task> {
        let mut occupied: Vec<TimeInterval> = others
            .iter()
            .filter(|task| !victims.iter().any(|victim| victim.id == task.id))
            .map(|task| task.interval)
            .collect();
        occupied.push(slot);

        let mut displaced = Vec::with_capacity(victims.len());
        let mut relocations = Vec::with_capacity(victims.len());
        for victim in victims {
            let target = self
                .relocation_regions(victim)
                .into_iter()
                .find_map(|region| {
                    first_fit(&region, victim.duration(), occupied.iter().copied())
                })
                .ok_or(*victim)?;

            occupied.push(target);
            let mut moved = place(victim, target);
            if !target.within(&victim.window) {
                moved.window = target;
            }
            relocations.push(Relocation {
                task_id: victim.id,
                title: victim.title.clone(),
                from: victim.interval,
                to: target,
            });
            displaced.push(moved);
        }
        Ok((displaced, relocations))
    }

    /// Own window first, then the same day, then the rest of the week.
    fn relocation_regions(&self, task: &Task) -> Vec<TimeInterval> {
        let mut regions = vec![task.window];
        let home = Weekday::of_minute(task.interval.start());
        if let Some(day) = home {
            regions.extend(self.relocation_hours.on(day));
        }
        regions.extend(
            Weekday::ALL
                .iter()
                .filter(|day| Some(**day) != home)
                .filter_map(|day| self.relocation_hours.on(*day)),
        );
        regions
    }
}

/// Fixed candidates may only occupy their requested interval.
fn search_window(candidate: &Task) -> TimeInterval {
    if candidate.is_fixed() {
        candidate.interval
    } else {
        candidate.window
    }
}

fn first_fit<I>(window: &TimeInterval, duration: i64, busy: I) -> Option<TimeInterval>
where
    I: IntoIterator<Item = TimeInterval>,
{
    free_subintervals(window, busy)
        .into_iter()
        .find(|piece| piece.duration() >= duration)
        .and_then(|piece| TimeInterval::starting_at(piece.start(), duration).ok())
}

/// Candidate starts inside `piece`: its start, then right after each movable
/// task ending inside it, so fewer neighbours need to move.
fn slot_starts(piece: &TimeInterval, duration: i64, movable: &[&Task]) -> Vec<i64> {
    let latest = piece.end() - duration;
    let mut starts = vec![piece.start()];
    starts.extend(
        movable
            .iter()
            .map(|task| task.interval.end())
            .filter(|end| *end > piece.start() && *end <= latest),
    );
    starts.sort_unstable();
    starts.dedup();
    starts
}

fn place(task: &Task, interval: TimeInterval) -> Task {
    let mut placed = task.clone();
    placed.interval = interval;
    if !interval.within(&placed.window) {
        placed.window = interval;
    }
    placed
}

fn blocker(task: &Task, reason: BlockReason) -> Blocker {
    Blocker {
        task_id: task.id,
        title: task.title.clone(),
        interval: task.interval,
        reason,
    }
}
