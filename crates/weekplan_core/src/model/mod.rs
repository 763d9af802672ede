//! Scheduling domain model.
//!
//! # Responsibility
//! - Define the canonical time, task, calendar and request shapes.
//! - Keep validation next to the data it guards.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Time is integer minutes within one planning week in a single zone.

pub mod calendar;
pub mod interval;
pub mod request;
pub mod task;
