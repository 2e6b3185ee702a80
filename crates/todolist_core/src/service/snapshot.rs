//! Snapshot codec for persisted store state.
//!
//! # Responsibility
//! - Encode the full group/task state as one JSON document.
//! - Decode current and legacy layouts back into a validated snapshot.
//!
//! # Invariants
//! - A decoded snapshot never contains duplicate or nil ids.
//! - Text fields are kept as stored, blank or not.
//! - Legacy nested layouts (groups holding their tasks with a boolean
//!   `completed`) are flattened; task order follows group order.

use crate::model::group::{now_epoch_ms, TaskGroup};
use crate::model::task::{Task, TaskPriority, TaskStatus};
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Snapshot layout version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full serialized state of groups and tasks at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub groups: Vec<TaskGroup>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl StoreSnapshot {
    pub fn new(groups: Vec<TaskGroup>, tasks: Vec<Task>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            groups,
            tasks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.tasks.is_empty()
    }

    /// Checks that ids are non-nil and unique within each collection.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut group_ids = HashSet::with_capacity(self.groups.len());
        for group in &self.groups {
            group.validate()?;
            if !group_ids.insert(group.id) {
                return Err(SnapshotError::DuplicateId(group.id));
            }
        }

        let mut task_ids = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            task.validate()?;
            if !task_ids.insert(task.id) {
                return Err(SnapshotError::DuplicateId(task.id));
            }
        }
        Ok(())
    }
}

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Snapshot encode/decode failure.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    UnsupportedVersion { found: u32, supported: u32 },
    DuplicateId(Uuid),
    Invalid(ValidationError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot json error: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "snapshot version {found} is newer than supported {supported}"
            ),
            Self::DuplicateId(id) => write!(f, "snapshot contains duplicate id: {id}"),
            Self::Invalid(err) => write!(f, "snapshot contains invalid record: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::UnsupportedVersion { .. } | Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ValidationError> for SnapshotError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    groups: &'a [TaskGroup],
    tasks: &'a [Task],
}

/// Encodes a snapshot as JSON bytes.
pub fn encode_snapshot(snapshot: &StoreSnapshot) -> Result<Vec<u8>, SnapshotError> {
    encode_parts(&snapshot.groups, &snapshot.tasks)
}

/// Encodes borrowed collections without building an owned snapshot first.
pub(crate) fn encode_parts(groups: &[TaskGroup], tasks: &[Task]) -> Result<Vec<u8>, SnapshotError> {
    let wire = SnapshotRef {
        version: SNAPSHOT_VERSION,
        groups,
        tasks,
    };
    Ok(serde_json::to_vec(&wire)?)
}

/// Layout the decoded bytes were stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotLayout {
    Current,
    /// Nested groups with boolean completion; needs rewriting once imported.
    Legacy,
}

/// Decodes and validates snapshot bytes.
///
/// # Errors
/// - `Json` when the bytes are not a recognized layout.
/// - `UnsupportedVersion` when written by a newer build.
/// - `DuplicateId` / `Invalid` when ids are duplicated or nil.
pub fn decode_snapshot(bytes: &[u8]) -> Result<StoreSnapshot, SnapshotError> {
    decode_with_layout(bytes).map(|(snapshot, _)| snapshot)
}

pub(crate) fn decode_with_layout(
    bytes: &[u8],
) -> Result<(StoreSnapshot, SnapshotLayout), SnapshotError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let (snapshot, layout) = match value {
        Value::Array(_) => {
            let legacy: Vec<LegacyGroup> = serde_json::from_value(value)?;
            (flatten_legacy(legacy), SnapshotLayout::Legacy)
        }
        other => (
            serde_json::from_value::<StoreSnapshot>(other)?,
            SnapshotLayout::Current,
        ),
    };

    if snapshot.version > SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    snapshot.validate()?;
    Ok((snapshot, layout))
}

#[derive(Deserialize)]
struct LegacyGroup {
    id: Uuid,
    name: String,
    #[serde(default)]
    tasks: Vec<LegacyTask>,
}

#[derive(Deserialize)]
struct LegacyTask {
    id: Uuid,
    title: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    completed: bool,
}

fn flatten_legacy(legacy: Vec<LegacyGroup>) -> StoreSnapshot {
    let imported_at = now_epoch_ms();
    let mut groups = Vec::with_capacity(legacy.len());
    let mut tasks = Vec::new();

    for group in legacy {
        for task in group.tasks {
            tasks.push(Task {
                id: task.id,
                title: task.title,
                details: task.details,
                status: if task.completed {
                    TaskStatus::Done
                } else {
                    TaskStatus::Todo
                },
                priority: TaskPriority::Medium,
                group_id: Some(group.id),
            });
        }
        groups.push(TaskGroup {
            id: group.id,
            name: group.name,
            description: String::new(),
            created_at: imported_at,
        });
    }

    StoreSnapshot::new(groups, tasks)
}
