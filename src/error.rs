// Validation errors for task operations

use thiserror::Error;

/// Reason an operation was rejected. No state is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task cannot be empty.")]
    EmptyText,

    #[error("Please select a due date.")]
    MissingDate,

    #[error("Due date cannot be in the past.")]
    PastDate,

    #[error("Invalid filter: {0} (expected all, active or completed)")]
    InvalidFilter(String),
}

impl ValidationError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyText => "empty-text",
            ValidationError::MissingDate => "missing-date",
            ValidationError::PastDate => "past-date",
            ValidationError::InvalidFilter(_) => "invalid-filter",
        }
    }
}
