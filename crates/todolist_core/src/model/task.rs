//! Task domain model.
//!
//! # Responsibility
//! - Define the to-do record with status, priority and optional group link.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is non-blank once the task has passed through `TaskStore`.
//! - `group_id` is a back-reference; it may point at a group that no longer
//!   exists only when the caller created it that way (orphan task).

use crate::model::group::GroupId;
use crate::model::{normalize_required, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task progress state. Any state may move to any other directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Work has started.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Stable wire name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parses a wire name. Accepts `in-progress` as an alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Task urgency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// One to-do item.
///
/// Serialized field names (`id`, `title`, `details`, `status`, `priority`,
/// `groupId`) are the persisted snapshot schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// `None` means ungrouped.
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Task {
    /// Builds a task with a fresh id and status `Todo`.
    ///
    /// Crate-private: tasks are only created through `TaskStore::add_task`.
    pub(crate) fn create(
        title: &str,
        details: impl Into<String>,
        priority: TaskPriority,
        group_id: Option<GroupId>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: normalize_required(title, ValidationError::BlankTitle)?,
            details: details.into(),
            status: TaskStatus::Todo,
            priority,
            group_id,
        })
    }

    /// Returns whether the task is finished.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Returns whether this task is in `group_id` (`None` = ungrouped).
    pub fn belongs_to(&self, group_id: Option<GroupId>) -> bool {
        self.group_id == group_id
    }

    /// Checks structural invariants of a stored record.
    ///
    /// Title text is kept as stored; the blank-title rule applies to new
    /// input only (`create`, `TaskStore::update_task`).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        Ok(())
    }
}
