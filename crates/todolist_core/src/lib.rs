//! Core domain logic for the to-do list.
//! This crate is the single source of truth for task/group invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::group::{GroupId, TaskGroup};
pub use model::task::{Task, TaskId, TaskPriority, TaskStatus};
pub use model::ValidationError;
pub use repo::pref_repo::{
    MemoryPreferenceRepository, PrefRepoError, PrefResult, PreferenceRepository,
    SqlitePreferenceRepository,
};
pub use service::filter::TaskFilter;
pub use service::snapshot::{
    decode_snapshot, encode_snapshot, SnapshotError, StoreSnapshot, SNAPSHOT_VERSION,
};
pub use service::task_store::{
    ChangeListener, ListenerId, StoreChange, StoreError, StoreResult, TaskStore, STATE_KEY,
    UNREADABLE_SUFFIX,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
