//! Guarded status transitions shared by the lifecycle service and the apply
//! engine.

use std::sync::Arc;

use mockable::Clock;

use crate::edit::{
    domain::{EditDomainError, EditTask, ErrorInfo, TaskId},
    ports::{EditEventSink, TaskRegistry, TaskRegistryError},
};

use super::{EditLifecycleError, EditLifecycleResult};

/// Outcome of a guarded transition.
#[derive(Debug)]
pub(super) enum Settled {
    /// The transition was stored and announced.
    Changed(EditTask),
    /// The state machine refused the transition; the task is returned as
    /// currently stored.
    Refused(EditTask),
}

impl Settled {
    pub(super) fn into_task(self) -> EditTask {
        match self {
            Self::Changed(task) | Self::Refused(task) => task,
        }
    }
}

/// Registry writes that announce every status change to the event sink.
pub(super) struct TaskTransitions<R, E, C> {
    registry: Arc<R>,
    events: Arc<E>,
    clock: Arc<C>,
}

impl<R, E, C> Clone for TaskTransitions<R, E, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            events: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, E, C> TaskTransitions<R, E, C>
where
    R: TaskRegistry,
    E: EditEventSink,
    C: Clock + Send + Sync,
{
    pub(super) const fn new(registry: Arc<R>, events: Arc<E>, clock: Arc<C>) -> Self {
        Self {
            registry,
            events,
            clock,
        }
    }

    pub(super) fn registry(&self) -> &R {
        &self.registry
    }

    pub(super) fn events(&self) -> &E {
        &self.events
    }

    pub(super) fn clock(&self) -> &C {
        &self.clock
    }

    pub(super) fn current(&self, id: TaskId) -> EditLifecycleResult<EditTask> {
        self.registry
            .get(id)?
            .ok_or(EditLifecycleError::NotFound(id))
    }

    /// Applies a status-changing mutation and emits the status event.
    ///
    /// The event is emitted before the registry releases the task, so
    /// status events for one task reach the sink in commit order.
    ///
    /// A refusal by the state machine is not an error: another flow, such
    /// as a user cancellation, got there first.
    pub(super) fn settle<F>(&self, id: TaskId, mutate: F) -> EditLifecycleResult<Settled>
    where
        F: FnOnce(&mut EditTask, &C) -> Result<(), EditDomainError>,
    {
        let clock = &*self.clock;
        let events = &*self.events;
        let written = self.registry.modify_and_notify(
            id,
            |task| mutate(task, clock),
            |task| events.on_task_status_changed(task),
        );
        match written {
            Ok(task) => {
                log_transition(&task);
                Ok(Settled::Changed(task))
            }
            Err(TaskRegistryError::Domain(
                EditDomainError::InvalidStateTransition { .. }
                | EditDomainError::ApplyAlreadyClaimed(_),
            )) => Ok(Settled::Refused(self.current(id)?)),
            Err(TaskRegistryError::NotFound(missing)) => Err(EditLifecycleError::NotFound(missing)),
            Err(err) => Err(err.into()),
        }
    }

    pub(super) fn fail(&self, id: TaskId, error: ErrorInfo) -> EditLifecycleResult<EditTask> {
        self.settle(id, |task, clock| task.fail(error, clock))
            .map(Settled::into_task)
    }

    pub(super) fn cancel(&self, id: TaskId, error: ErrorInfo) -> EditLifecycleResult<Settled> {
        self.settle(id, |task, clock| task.cancel(error, clock))
    }
}

fn log_transition(task: &EditTask) {
    let status = task.status();
    match task.error() {
        Some(error) => tracing::info!(
            task_id = %task.id(),
            %status,
            kind = %error.kind,
            cause = %error.message,
            "task finished"
        ),
        None if status.is_terminal() => {
            tracing::info!(task_id = %task.id(), %status, "task finished");
        }
        None => tracing::debug!(task_id = %task.id(), %status, "task status changed"),
    }
}
