//! Task group model.
//!
//! A group is a named label. Membership is derived by scanning tasks for a
//! matching `group_id`; the group itself stores no task list.

use crate::model::{normalize_required, ValidationError};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable group identifier.
pub type GroupId = Uuid;

/// Named collection label that tasks may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unix epoch milliseconds. Set once at creation.
    #[serde(default)]
    pub created_at: i64,
}

impl TaskGroup {
    pub(crate) fn create(name: &str, description: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_required(name, ValidationError::BlankName)?,
            description: description.into(),
            created_at: now_epoch_ms(),
        })
    }

    /// Checks structural invariants of a stored record. Names are kept as stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        Ok(())
    }
}

/// Current wall clock in epoch milliseconds; `0` if the clock is before 1970.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
