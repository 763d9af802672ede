//! Core weekly scheduling engine.
//! This crate is the single source of truth for calendar invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;
pub mod store;

pub use config::{ConfigError, DayHours, EngineConfig, LoggingConfig};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::calendar::{Calendar, DEFAULT_TITLE_SIMILARITY};
pub use model::interval::{
    free_subintervals, week_minute, IntervalError, Minute, TimeInterval, Weekday,
    MINUTES_PER_DAY, MINUTES_PER_HOUR, MINUTES_PER_WEEK,
};
pub use model::request::{ChangeKind, ChangeRequest, TaskDraft};
pub use model::task::{Priority, Task, TaskId, TaskStatus, TaskValidationError};
pub use repo::calendar_repo::{CalendarRepository, RepoError, RepoResult, SqliteCalendarRepository};
pub use schedule::conflict::{detect_conflicts, sweep_overlaps, Conflict, OverlapPair, Severity};
pub use schedule::placement::{BlockReason, Blocker, Placement, PlacementResolver, Relocation};
pub use service::outcome::{
    Diagnostic, DiagnosticCode, ResolutionOutcome, RevisionError, RevisionStage,
};
pub use service::revision_controller::RevisionController;
pub use service::revision_queue::{PendingRevision, QueueError, RevisionQueue};
pub use store::task_store::{StoreError, StoreOp, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
