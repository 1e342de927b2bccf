//! End-to-end task flows against the scripted backend.

use super::helpers::{Harness, assert_outcome, harness, request, wait_for_prompts};
use rstest::rstest;
use scrivener::backend::domain::SessionId;
use scrivener::config::{EditConfig, ReadinessPolicy};
use scrivener::edit::{
    adapters::memory::{ChannelEventSink, StaticReviewGate},
    domain::{ErrorKind, TaskStatus},
    ports::EditEvent,
};
use std::sync::Arc;

#[rstest]
#[tokio::test]
async fn submitted_edit_replaces_region_and_completes(harness: Harness) {
    let buffer = harness.open("lua", "local x = 1\nprint(x)\nreturn x");
    harness.reply("```lua\nprint(x or 0)\n```");
    let service = harness.service(EditConfig::default());

    let handle = service
        .submit(request(buffer, 2, 2, "handle nil"))
        .expect("task submitted");
    let task_id = handle.task_id();
    let task = handle.wait().await.expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Completed);
    assert_eq!(task.result_text(), Some("print(x or 0)"));
    assert_eq!(harness.text(buffer), "local x = 1\nprint(x or 0)\nreturn x");
    assert_eq!(
        harness.events.statuses_for(task_id),
        vec![TaskStatus::Running, TaskStatus::Completed]
    );

    let prompts = harness.backend.prompts().expect("prompts readable");
    assert_eq!(prompts.len(), 1);
    let prompt = prompts.first().expect("one prompt");
    assert_eq!(prompt.session, SessionId::new("ses_0001"));
    assert!(prompt.prompt.contains("handle nil"));
    assert!(prompt.prompt.contains("print(x)"));
    assert!(harness.backend.aborted().expect("aborts readable").is_empty());
}

#[rstest]
#[tokio::test]
async fn imports_directive_lands_after_existing_imports(harness: Harness) {
    let buffer = harness.open("python", "import os\n\ndef f():\n    return 1");
    harness.reply("# IMPORTS: import sys\ndef f():\n    return sys.maxsize");
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 3, 4, "return the max size"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Completed);
    assert_eq!(
        harness.text(buffer),
        "import os\nimport sys\n\ndef f():\n    return sys.maxsize"
    );
}

#[rstest]
#[tokio::test]
async fn model_selection_reaches_the_backend(harness: Harness) {
    let buffer = harness.open("rust", "fn main() {}");
    harness.reply("fn main() { run(); }");
    let service = harness.service(EditConfig {
        model: Some("anthropic/claude-sonnet".to_owned()),
        ..EditConfig::default()
    });

    service
        .submit(request(buffer, 1, 1, "call run"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    let prompts = harness.backend.prompts().expect("prompts readable");
    let model = prompts
        .first()
        .and_then(|prompt| prompt.model.clone())
        .expect("model forwarded");
    assert_eq!(model.provider_id(), "anthropic");
    assert_eq!(model.model_id(), "claude-sonnet");
}

#[rstest]
#[tokio::test]
async fn session_failure_fails_the_task_without_touching_the_document(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness
        .backend
        .fail_session_creation("server offline")
        .expect("failure configured");
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Failed);
    let error = task.error().expect("failure recorded");
    assert_eq!(error.kind, ErrorKind::BackendRejected);
    assert!(error.message.contains("server offline"));
    assert_eq!(harness.text(buffer), "print(1)");
    assert!(task.session().is_none());
}

#[rstest]
#[tokio::test]
async fn missing_reply_is_a_backend_rejection(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Failed);
    assert_eq!(
        task.error().map(|error| error.kind),
        Some(ErrorKind::BackendRejected)
    );
    assert_eq!(task.session(), Some(&SessionId::new("ses_0001")));
}

#[rstest]
#[case::fence_only("```\n```", ErrorKind::EmptyBody)]
#[case::directive_only("-- IMPORTS: local json = require('json')", ErrorKind::EmptyBody)]
#[case::empty("", ErrorKind::NoContent)]
#[tokio::test]
async fn unusable_replies_fail_the_task(
    harness: Harness,
    #[case] reply: &str,
    #[case] expected: ErrorKind,
) {
    let buffer = harness.open("lua", "print(1)");
    harness.reply(reply);
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Failed);
    assert_eq!(task.error().map(|error| error.kind), Some(expected));
    assert_eq!(harness.text(buffer), "print(1)");
}

#[rstest]
#[tokio::test]
async fn closed_buffer_fails_with_target_gone(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.backend.hold_prompts();
    harness.reply("print(2)");
    let service = harness.service(EditConfig::default());

    let handle = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted");
    wait_for_prompts(&harness.backend, 1).await;
    assert!(harness.document.close_buffer(buffer).expect("buffer closed"));
    harness.backend.release_prompts();
    let task = handle.wait().await.expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Failed);
    assert_eq!(task.error().map(|error| error.kind), Some(ErrorKind::TargetGone));
}

#[rstest]
#[tokio::test]
async fn readiness_gate_polls_until_the_backend_is_ready(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.backend.set_ready_after(2).expect("readiness configured");
    harness.reply("print(2)");
    let service = harness.service(EditConfig {
        readiness: ReadinessPolicy {
            enabled: true,
            max_attempts: 5,
            interval_ms: 1,
        },
        ..EditConfig::default()
    });

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Completed);
    assert_eq!(harness.backend.readiness_checks().expect("checks readable"), 3);
}

#[rstest]
#[tokio::test]
async fn readiness_exhaustion_fails_before_any_session(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.backend.set_ready_after(10).expect("readiness configured");
    let service = harness.service(EditConfig {
        readiness: ReadinessPolicy {
            enabled: true,
            max_attempts: 2,
            interval_ms: 1,
        },
        ..EditConfig::default()
    });

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Failed);
    assert!(harness.backend.sessions().expect("sessions readable").is_empty());
}

#[rstest]
#[tokio::test]
async fn channel_sink_streams_the_lifecycle(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.reply("print(2)");
    let (sink, mut receiver) = ChannelEventSink::channel();
    let service = harness.service_with(
        StaticReviewGate::accept_all(),
        Arc::new(sink),
        EditConfig::default(),
    );

    let handle = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted");
    let task_id = handle.task_id();
    handle.wait().await.expect("pipeline finished");

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            EditEvent::Created { task_id },
            EditEvent::StatusChanged {
                task_id,
                status: TaskStatus::Running,
            },
            EditEvent::StatusChanged {
                task_id,
                status: TaskStatus::Completed,
            },
        ]
    );
}

#[rstest]
#[tokio::test]
async fn finished_tasks_can_be_cleaned_up(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.reply("print(2)");
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert_eq!(
        service.tasks_for_buffer(buffer).expect("query succeeds").len(),
        1
    );
    assert!(service.active_tasks().expect("query succeeds").is_empty());
    let removed = service.cleanup(task.id()).expect("cleanup succeeds");
    assert_eq!(removed.id(), task.id());
    assert!(service.find(task.id()).expect("query succeeds").is_none());
}
