//! Review mode driven by a UI over a channel.

use super::helpers::{Harness, Service, assert_outcome, harness, request, stored};
use rstest::rstest;
use scrivener::config::{ConflictPolicy, EditConfig};
use scrivener::edit::{
    adapters::memory::{ChannelReviewGate, RecordingEventSink, ReviewRequest},
    domain::{ErrorKind, TaskStatus},
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn review_service(
    harness: &Harness,
    conflict: ConflictPolicy,
) -> (
    Service<ChannelReviewGate, RecordingEventSink>,
    UnboundedReceiver<ReviewRequest>,
) {
    let (gate, requests) = ChannelReviewGate::channel();
    let service = harness.service_with(
        gate,
        Arc::clone(&harness.events),
        EditConfig {
            review_mode: true,
            conflict,
            ..EditConfig::default()
        },
    );
    (service, requests)
}

#[rstest]
#[tokio::test]
async fn accepted_review_applies_the_proposal(harness: Harness) {
    let buffer = harness.open("lua", "foo()");
    harness.reply("foo_safe()");
    let (service, mut requests) = review_service(&harness, ConflictPolicy::default());

    let handle = service
        .submit(request(buffer, 1, 1, "make it safe"))
        .expect("task submitted");
    let review = requests.recv().await.expect("review requested");
    assert_eq!(review.proposed_text(), "foo_safe()");
    assert_eq!(review.task().id(), handle.task_id());
    assert_eq!(harness.text(buffer), "foo()");
    review.accept();

    let task = handle.wait().await.expect("pipeline finished");
    assert_outcome(&task, TaskStatus::Completed);
    assert_eq!(harness.text(buffer), "foo_safe()");
}

#[rstest]
#[tokio::test]
async fn rejected_review_cancels_without_mutation(harness: Harness) {
    let buffer = harness.open("lua", "foo()");
    harness.reply("foo_safe()");
    let (service, mut requests) = review_service(&harness, ConflictPolicy::default());

    let handle = service
        .submit(request(buffer, 1, 1, "make it safe"))
        .expect("task submitted");
    requests.recv().await.expect("review requested").reject();

    let task = handle.wait().await.expect("pipeline finished");
    assert_outcome(&task, TaskStatus::Cancelled);
    assert_eq!(task.error().map(|error| error.kind), Some(ErrorKind::UserRejected));
    assert_eq!(harness.text(buffer), "foo()");
}

#[rstest]
#[tokio::test]
async fn abandoned_review_counts_as_rejection(harness: Harness) {
    let buffer = harness.open("lua", "foo()");
    harness.reply("foo_safe()");
    let (service, mut requests) = review_service(&harness, ConflictPolicy::default());

    let handle = service
        .submit(request(buffer, 1, 1, "make it safe"))
        .expect("task submitted");
    drop(requests.recv().await.expect("review requested"));

    let task = handle.wait().await.expect("pipeline finished");
    assert_outcome(&task, TaskStatus::Cancelled);
    assert_eq!(task.error().map(|error| error.kind), Some(ErrorKind::UserRejected));
}

#[rstest]
#[case::warn(ConflictPolicy::default(), TaskStatus::Completed, "foo_safe()")]
#[case::cancel(
    ConflictPolicy { warn_on_conflict: true, cancel_on_conflict: true },
    TaskStatus::Cancelled,
    "bar()"
)]
#[tokio::test]
async fn edits_made_during_review_are_checked_again(
    harness: Harness,
    #[case] conflict: ConflictPolicy,
    #[case] expected: TaskStatus,
    #[case] final_text: &str,
) {
    let buffer = harness.open("lua", "foo()");
    harness.reply("foo_safe()");
    let (service, mut requests) = review_service(&harness, conflict);

    let handle = service
        .submit(request(buffer, 1, 1, "make it safe"))
        .expect("task submitted");
    let task_id = handle.task_id();
    let review = requests.recv().await.expect("review requested");
    harness
        .document
        .set_line(buffer, 0, "bar()")
        .expect("user edit applied");
    review.accept();

    let task = handle.wait().await.expect("pipeline finished");
    assert_outcome(&task, expected);
    assert_eq!(harness.text(buffer), final_text);
    if expected == TaskStatus::Completed {
        assert_eq!(harness.events.conflict_warnings_for(task_id), 1);
    } else {
        assert_eq!(
            task.error().map(|error| error.kind),
            Some(ErrorKind::ConflictCancelled)
        );
    }
}

#[rstest]
#[tokio::test]
async fn cancelling_during_review_wins_over_a_late_accept(harness: Harness) {
    let buffer = harness.open("lua", "foo()");
    harness.reply("foo_safe()");
    let (service, mut requests) = review_service(&harness, ConflictPolicy::default());

    let handle = service
        .submit(request(buffer, 1, 1, "make it safe"))
        .expect("task submitted");
    let task_id = handle.task_id();
    let review = requests.recv().await.expect("review requested");

    assert!(service.cancel(task_id).expect("cancel succeeds"));
    let task = handle.wait().await.expect("pipeline finished");
    review.accept();

    assert_outcome(&task, TaskStatus::Cancelled);
    assert_outcome(&stored(&service, task_id), TaskStatus::Cancelled);
    assert_eq!(harness.text(buffer), "foo()");
}
