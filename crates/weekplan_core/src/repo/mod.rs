//! Persistence adapters for calendar snapshots.
//!
//! # Responsibility
//! - Implement the persistence collaborator over SQLite.
//! - Keep storage concerns outside the revision transaction.
//!
//! # Invariants
//! - Writes validate every task before touching storage.

pub mod calendar_repo;
