//! Task view scopes used by list sections.

use crate::model::group::GroupId;
use crate::model::task::{Task, TaskStatus};

/// Predicate selecting the tasks shown in one list section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Every task.
    #[default]
    All,
    /// Tasks in one group; `None` selects ungrouped tasks.
    Group(Option<GroupId>),
    /// Tasks with one status across all groups.
    Status(TaskStatus),
    /// Tasks with one status inside one group section.
    GroupStatus(Option<GroupId>, TaskStatus),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match *self {
            Self::All => true,
            Self::Group(group_id) => task.belongs_to(group_id),
            Self::Status(status) => task.status == status,
            Self::GroupStatus(group_id, status) => {
                task.belongs_to(group_id) && task.status == status
            }
        }
    }
}

impl From<Option<GroupId>> for TaskFilter {
    fn from(value: Option<GroupId>) -> Self {
        Self::Group(value)
    }
}
