//! In-memory task registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::edit::{
    domain::{BufferId, EditDomainError, EditTask, TaskId},
    ports::{TaskRegistry, TaskRegistryError, TaskRegistryResult},
};

/// Thread-safe in-memory task registry.
///
/// Tasks stay stored after reaching a terminal status until removed or
/// purged, so their outcome remains inspectable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    tasks: HashMap<TaskId, EditTask>,
    buffer_index: HashMap<BufferId, Vec<TaskId>>,
}

impl InMemoryTaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRegistryResult<RwLockReadGuard<'_, InMemoryRegistryState>> {
        self.state.read().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRegistryResult<RwLockWriteGuard<'_, InMemoryRegistryState>> {
        self.state.write().map_err(|err| {
            TaskRegistryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Removes a task ID from the buffer index, cleaning up the entry if empty.
fn remove_from_index(state: &mut InMemoryRegistryState, task: &EditTask) {
    let buffer = task.region().buffer();
    if let Some(ids) = state.buffer_index.get_mut(&buffer) {
        ids.retain(|id| *id != task.id());
        if ids.is_empty() {
            state.buffer_index.remove(&buffer);
        }
    }
}

impl TaskRegistry for InMemoryTaskRegistry {
    fn insert_and_notify<N>(&self, task: EditTask, committed: N) -> TaskRegistryResult<()>
    where
        N: FnOnce(&EditTask),
    {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRegistryError::DuplicateTask(task.id()));
        }
        state
            .buffer_index
            .entry(task.region().buffer())
            .or_default()
            .push(task.id());
        committed(&task);
        state.tasks.insert(task.id(), task);
        Ok(())
    }

    fn get(&self, id: TaskId) -> TaskRegistryResult<Option<EditTask>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    fn modify_and_notify<F, N>(
        &self,
        id: TaskId,
        mutate: F,
        committed: N,
    ) -> TaskRegistryResult<EditTask>
    where
        F: FnOnce(&mut EditTask) -> Result<(), EditDomainError>,
        N: FnOnce(&EditTask),
    {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRegistryError::NotFound(id))?;
        let mut updated = stored.clone();
        mutate(&mut updated)?;
        *stored = updated.clone();
        committed(&updated);
        Ok(updated)
    }

    fn find_by_buffer(&self, buffer: BufferId) -> TaskRegistryResult<Vec<EditTask>> {
        let state = self.read()?;
        Ok(state
            .buffer_index
            .get(&buffer)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_active(&self) -> TaskRegistryResult<Vec<EditTask>> {
        Ok(self
            .read()?
            .tasks
            .values()
            .filter(|task| task.status().is_active())
            .cloned()
            .collect())
    }

    fn all(&self) -> TaskRegistryResult<Vec<EditTask>> {
        Ok(self.read()?.tasks.values().cloned().collect())
    }

    fn remove(&self, id: TaskId) -> TaskRegistryResult<Option<EditTask>> {
        let mut state = self.write()?;
        let removed = state.tasks.remove(&id);
        if let Some(task) = &removed {
            remove_from_index(&mut state, task);
        }
        Ok(removed)
    }

    fn purge_terminal(&self) -> TaskRegistryResult<usize> {
        let mut state = self.write()?;
        let terminal: Vec<EditTask> = state
            .tasks
            .values()
            .filter(|task| task.status().is_terminal())
            .cloned()
            .collect();
        for task in &terminal {
            state.tasks.remove(&task.id());
            remove_from_index(&mut state, task);
        }
        Ok(terminal.len())
    }
}
