//! Task storage for the revision controller.
//!
//! # Responsibility
//! - Own every committed task of one week.
//! - Expose snapshot reads and all-or-nothing batch writes.
//!
//! # Invariants
//! - Snapshots are copies, never live views.

pub mod task_store;
