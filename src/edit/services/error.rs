//! Service-level errors for edit orchestration.

use crate::edit::{
    domain::{EditDomainError, TaskId},
    ports::{DocumentError, TaskRegistryError},
};
use thiserror::Error;

/// Service-level errors for edit lifecycle operations.
///
/// These describe failures of the orchestration calls themselves. Failures
/// of a task's own pipeline are recorded on the task as an
/// [`ErrorInfo`](crate::edit::domain::ErrorInfo) instead.
#[derive(Debug, Clone, Error)]
pub enum EditLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] EditDomainError),

    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] TaskRegistryError),

    /// The document could not be read while creating a task.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// No task with this identifier is registered.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task is still pending or running.
    #[error("task {0} is still active")]
    TaskStillActive(TaskId),

    /// The task pipeline was already started.
    #[error("task {0} is already executing")]
    AlreadyExecuting(TaskId),

    /// The service was shut down and accepts no new tasks.
    #[error("edit service is shut down")]
    ShutDown,

    /// The spawned task pipeline did not run to completion.
    #[error("task {task_id} pipeline aborted: {reason}")]
    PipelineAborted {
        /// Task identifier.
        task_id: TaskId,
        /// Join failure description.
        reason: String,
    },
}

/// Result type for edit lifecycle service operations.
pub type EditLifecycleResult<T> = Result<T, EditLifecycleError>;
