//! Event sink adapters.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::edit::{
    domain::{EditTask, TaskId, TaskStatus},
    ports::{EditEvent, EditEventSink},
};

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EditEventSink for NoopEventSink {
    fn on_task_created(&self, _task: &EditTask) {}

    fn on_task_status_changed(&self, _task: &EditTask) {}

    fn on_conflict_warning(&self, _task: &EditTask) {}

    fn on_notice(&self, _task: &EditTask, _message: &str) {}
}

/// Sink that keeps every event in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<EditEvent>>>,
}

impl RecordingEventSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: EditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(err) => tracing::warn!(error = %err, "event recorder lock poisoned"),
        }
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<EditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the status transitions recorded for `task_id`, in order.
    #[must_use]
    pub fn statuses_for(&self, task_id: TaskId) -> Vec<TaskStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EditEvent::StatusChanged { task_id: id, status } if id == task_id => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Returns how many conflict warnings were recorded for `task_id`.
    #[must_use]
    pub fn conflict_warnings_for(&self, task_id: TaskId) -> usize {
        self.events()
            .iter()
            .filter(|event| {
                matches!(event, EditEvent::ConflictWarning { task_id: id } if *id == task_id)
            })
            .count()
    }

    /// Returns the notices recorded for `task_id`.
    #[must_use]
    pub fn notices_for(&self, task_id: TaskId) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EditEvent::Notice { task_id: id, message } if id == task_id => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl EditEventSink for RecordingEventSink {
    fn on_task_created(&self, task: &EditTask) {
        self.record(EditEvent::Created { task_id: task.id() });
    }

    fn on_task_status_changed(&self, task: &EditTask) {
        self.record(EditEvent::StatusChanged {
            task_id: task.id(),
            status: task.status(),
        });
    }

    fn on_conflict_warning(&self, task: &EditTask) {
        self.record(EditEvent::ConflictWarning { task_id: task.id() });
    }

    fn on_notice(&self, task: &EditTask, message: &str) {
        self.record(EditEvent::Notice {
            task_id: task.id(),
            message: message.to_owned(),
        });
    }
}

/// Sink forwarding events over an unbounded channel to a UI task.
///
/// Sending never blocks. Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<EditEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver that observes its events.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EditEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: EditEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

impl EditEventSink for ChannelEventSink {
    fn on_task_created(&self, task: &EditTask) {
        self.forward(EditEvent::Created { task_id: task.id() });
    }

    fn on_task_status_changed(&self, task: &EditTask) {
        self.forward(EditEvent::StatusChanged {
            task_id: task.id(),
            status: task.status(),
        });
    }

    fn on_conflict_warning(&self, task: &EditTask) {
        self.forward(EditEvent::ConflictWarning { task_id: task.id() });
    }

    fn on_notice(&self, task: &EditTask, message: &str) {
        self.forward(EditEvent::Notice {
            task_id: task.id(),
            message: message.to_owned(),
        });
    }
}
