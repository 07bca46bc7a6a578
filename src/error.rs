// Domain errors for task operations

use thiserror::Error;

/// Recoverable failures surfaced to the user as an error notice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Please enter a task!")]
    EmptyText,

    #[error("Task is too long! Maximum {max} characters (got {len}).")]
    TooLong { len: usize, max: usize },

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid import format: {0}")]
    InvalidImportFormat(String),

    #[error("Failed to save tasks: {0}")]
    PersistenceWriteFailed(String),
}

impl TaskError {
    /// Wrap a slot failure, keeping the whole error chain
    pub fn persistence(err: &eyre::Report) -> Self {
        TaskError::PersistenceWriteFailed(format!("{:#}", err))
    }
}
