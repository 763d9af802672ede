//! Scheduling algorithms: conflict detection and placement.
//!
//! # Responsibility
//! - Keep the pure, side-effect-free algorithms apart from orchestration.
//!
//! # Invariants
//! - Nothing here mutates the task store; callers commit results.

pub mod conflict;
pub mod placement;
