//! UI event port.

use crate::edit::domain::{EditTask, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// Notification emitted towards the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditEvent {
    /// A task was created.
    Created {
        /// Task identifier.
        task_id: TaskId,
    },
    /// A task changed status.
    StatusChanged {
        /// Task identifier.
        task_id: TaskId,
        /// New status.
        status: TaskStatus,
    },
    /// The region changed since the snapshot and the result is applied
    /// anyway.
    ConflictWarning {
        /// Task identifier.
        task_id: TaskId,
    },
    /// A non-fatal notice, such as a failed import insertion.
    Notice {
        /// Task identifier.
        task_id: TaskId,
        /// Human-readable notice.
        message: String,
    },
}

/// Receives task lifecycle notifications.
///
/// Calls are made from task flows and must not block. Creation and status
/// callbacks run while the registry holds the task, so they arrive in commit
/// order and must not call back into the registry.
pub trait EditEventSink: Send + Sync {
    /// Called once after a task is stored.
    fn on_task_created(&self, task: &EditTask);

    /// Called after every status transition.
    fn on_task_status_changed(&self, task: &EditTask);

    /// Called when a conflict is detected and policy says warn.
    fn on_conflict_warning(&self, task: &EditTask);

    /// Called for non-fatal notices.
    fn on_notice(&self, task: &EditTask, message: &str);
}
