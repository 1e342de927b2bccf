//! Error types for edit domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning edit domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditDomainError {
    /// Region bounds are not 1-indexed or not ordered.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// The edit instruction is empty after trimming.
    #[error("edit instruction must not be empty")]
    EmptyPrompt,

    /// The requested status transition is not in the state machine.
    #[error("invalid task status transition for {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The backend session handle was already recorded.
    #[error("task {0} already has a backend session")]
    SessionAlreadyAssigned(TaskId),

    /// The task was already claimed for apply.
    #[error("task {0} is already being applied")]
    ApplyAlreadyClaimed(TaskId),
}

/// Error returned while parsing task status strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
