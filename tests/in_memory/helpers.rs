//! Shared helpers for in-memory edit integration tests.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use scrivener::backend::adapters::memory::ScriptedBackend;
use scrivener::backend::domain::BackendResponse;
use scrivener::config::EditConfig;
use scrivener::edit::{
    adapters::memory::{
        InMemoryDocumentStore, InMemoryTaskRegistry, RecordingEventSink, StaticReviewGate,
    },
    domain::{BufferId, EditTask, Region, TaskId, TaskStatus},
    ports::{EditEventSink, ReviewGate},
    services::{EditLifecycleService, SubmitEditRequest},
};

/// Lifecycle service wired to in-memory adapters.
pub type Service<G = StaticReviewGate, E = RecordingEventSink> = EditLifecycleService<
    InMemoryTaskRegistry,
    InMemoryDocumentStore,
    ScriptedBackend,
    G,
    E,
    DefaultClock,
>;

/// In-memory collaborators shared by a test.
pub struct Harness {
    pub registry: Arc<InMemoryTaskRegistry>,
    pub document: Arc<InMemoryDocumentStore>,
    pub backend: Arc<ScriptedBackend>,
    pub events: Arc<RecordingEventSink>,
}

impl Harness {
    /// Builds a service that accepts every review and records events.
    pub fn service(&self, config: EditConfig) -> Service {
        self.service_with(StaticReviewGate::accept_all(), Arc::clone(&self.events), config)
    }

    /// Builds a service with a custom review gate and event sink.
    pub fn service_with<G, E>(&self, review: G, events: Arc<E>, config: EditConfig) -> Service<G, E>
    where
        G: ReviewGate + 'static,
        E: EditEventSink + 'static,
    {
        EditLifecycleService::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.document),
            Arc::clone(&self.backend),
            Arc::new(review),
            events,
            Arc::new(DefaultClock),
            config,
        )
        .expect("test configuration is valid")
    }

    /// Opens a buffer holding `text`.
    pub fn open(&self, filetype: &str, text: &str) -> BufferId {
        self.document
            .open_buffer(Some(filetype), text)
            .expect("buffer should open")
    }

    /// Queues a plain-text backend reply.
    pub fn reply(&self, text: &str) {
        self.backend
            .push_reply(BackendResponse::text(text))
            .expect("reply should queue");
    }

    /// Returns the full text of `buffer`.
    pub fn text(&self, buffer: BufferId) -> String {
        self.document.text(buffer).expect("buffer should exist")
    }
}

/// Provides fresh in-memory collaborators for each test.
#[fixture]
pub fn harness() -> Harness {
    Harness {
        registry: Arc::new(InMemoryTaskRegistry::new()),
        document: Arc::new(InMemoryDocumentStore::new()),
        backend: Arc::new(ScriptedBackend::new()),
        events: Arc::new(RecordingEventSink::new()),
    }
}

/// Builds a request over whole lines `start..=end` of `buffer`.
pub fn request(buffer: BufferId, start: usize, end: usize, prompt: &str) -> SubmitEditRequest {
    let region = Region::whole_lines(buffer, start, end).expect("valid region");
    SubmitEditRequest::new(region, prompt)
}

/// Polls `condition` until it holds or a generous deadline passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Waits until the backend has received `count` prompts.
pub async fn wait_for_prompts(backend: &ScriptedBackend, count: usize) {
    let arrived = eventually(|| {
        backend
            .prompts()
            .is_ok_and(|prompts| prompts.len() >= count)
    })
    .await;
    assert!(arrived, "backend never received {count} prompt(s)");
}

/// Returns the stored task, which must exist.
pub fn stored<G, E>(service: &Service<G, E>, task_id: TaskId) -> EditTask
where
    G: ReviewGate + 'static,
    E: EditEventSink + 'static,
{
    service
        .find(task_id)
        .expect("registry readable")
        .expect("task should exist")
}

/// Asserts a task's status and error kind in one place.
pub fn assert_outcome(task: &EditTask, status: TaskStatus) {
    assert_eq!(
        task.status(),
        status,
        "unexpected outcome, error: {:?}",
        task.error()
    );
}
