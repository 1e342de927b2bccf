//! Registry port for edit task storage and lookup.

use crate::edit::domain::{BufferId, EditDomainError, EditTask, TaskId};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task registry operations.
pub type TaskRegistryResult<T> = Result<T, TaskRegistryError>;

/// Concurrent-safe store of edit tasks.
///
/// The registry is the only resource mutated by several task flows at once.
/// Implementations must make every operation on a single task mutually
/// exclusive with every other operation on it, so read-modify-write cycles
/// go through [`TaskRegistry::modify`] rather than `get` followed by a
/// separate write.
///
/// The `*_and_notify` variants run a callback on the committed task before
/// the write is released. Observers fed from that callback see the writes
/// to one task in commit order. The callback must not call back into the
/// registry.
pub trait TaskRegistry: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::DuplicateTask`] when the identifier is
    /// already present.
    fn insert(&self, task: EditTask) -> TaskRegistryResult<()> {
        self.insert_and_notify(task, |_| {})
    }

    /// Stores a new task and runs `committed` on it inside the write.
    ///
    /// `committed` is not called when the insert fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::DuplicateTask`] when the identifier is
    /// already present.
    fn insert_and_notify<N>(&self, task: EditTask, committed: N) -> TaskRegistryResult<()>
    where
        N: FnOnce(&EditTask);

    /// Returns a copy of the task, if present.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn get(&self, id: TaskId) -> TaskRegistryResult<Option<EditTask>>;

    /// Atomically applies `mutate` to the stored task and returns the
    /// updated copy.
    ///
    /// When `mutate` fails the stored task is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::NotFound`] for unknown tasks and
    /// [`TaskRegistryError::Domain`] when `mutate` rejects the change.
    fn modify<F>(&self, id: TaskId, mutate: F) -> TaskRegistryResult<EditTask>
    where
        F: FnOnce(&mut EditTask) -> Result<(), EditDomainError>,
    {
        self.modify_and_notify(id, mutate, |_| {})
    }

    /// Like [`TaskRegistry::modify`], then runs `committed` on the updated
    /// task before another operation on it can start.
    ///
    /// `committed` is not called when `mutate` fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::NotFound`] for unknown tasks and
    /// [`TaskRegistryError::Domain`] when `mutate` rejects the change.
    fn modify_and_notify<F, N>(
        &self,
        id: TaskId,
        mutate: F,
        committed: N,
    ) -> TaskRegistryResult<EditTask>
    where
        F: FnOnce(&mut EditTask) -> Result<(), EditDomainError>,
        N: FnOnce(&EditTask);

    /// Returns all tasks targeting `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn find_by_buffer(&self, buffer: BufferId) -> TaskRegistryResult<Vec<EditTask>>;

    /// Returns all `pending` and `running` tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn find_active(&self) -> TaskRegistryResult<Vec<EditTask>>;

    /// Returns every stored task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn all(&self) -> TaskRegistryResult<Vec<EditTask>>;

    /// Removes and returns a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn remove(&self, id: TaskId) -> TaskRegistryResult<Option<EditTask>>;

    /// Removes every terminal task and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRegistryError::Persistence`] when the store is
    /// unusable.
    fn purge_terminal(&self) -> TaskRegistryResult<usize>;
}

/// Errors returned by task registry implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRegistryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The requested mutation violated a domain rule.
    #[error(transparent)]
    Domain(#[from] EditDomainError),

    /// Storage-layer failure.
    #[error("registry storage error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRegistryError {
    /// Wraps a storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
