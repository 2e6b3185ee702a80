//! Domain model for tasks and the groups they may reference.
//!
//! # Responsibility
//! - Define the canonical records owned by `TaskStore`.
//! - Reject blank text on new input; stored records only need non-nil ids.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - A task references a group by id only; groups never own tasks.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod group;
pub mod task;

/// Field-level validation failure for tasks and groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is empty after trim.
    BlankTitle,
    /// Group name is empty after trim.
    BlankName,
    /// Record id is the nil UUID.
    NilId,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::BlankName => write!(f, "group name must not be blank"),
            Self::NilId => write!(f, "record id must not be nil"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a required display string, rejecting blank input with `error`.
pub(crate) fn normalize_required(
    value: &str,
    error: ValidationError,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_required, ValidationError};

    #[test]
    fn normalize_required_trims_and_rejects_blank() {
        assert_eq!(
            normalize_required("  Work ", ValidationError::BlankName).unwrap(),
            "Work"
        );
        assert_eq!(
            normalize_required(" \t\n", ValidationError::BlankTitle).unwrap_err(),
            ValidationError::BlankTitle
        );
    }
}
