//! Cancellation, shutdown, and backend abort behaviour.

use super::helpers::{Harness, assert_outcome, eventually, harness, request, wait_for_prompts};
use rstest::rstest;
use scrivener::backend::domain::SessionId;
use scrivener::config::EditConfig;
use scrivener::edit::{
    domain::{ErrorKind, TaskStatus},
    services::EditLifecycleError,
};

#[rstest]
#[case::abort_succeeds(false)]
#[case::abort_fails(true)]
#[tokio::test]
async fn cancelling_a_running_task_aborts_its_session(harness: Harness, #[case] abort_fails: bool) {
    let buffer = harness.open("lua", "print(1)");
    if abort_fails {
        harness.backend.fail_aborts("abort refused").expect("configured");
    }
    harness.backend.hold_prompts();
    harness.reply("print(2)");
    let service = harness.service(EditConfig::default());

    let handle = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted");
    let task_id = handle.task_id();
    wait_for_prompts(&harness.backend, 1).await;

    assert!(service.cancel(task_id).expect("cancel succeeds"));
    let task = handle.wait().await.expect("pipeline finished");

    assert_outcome(&task, TaskStatus::Cancelled);
    assert_eq!(task.error().map(|error| error.kind), Some(ErrorKind::UserCancelled));
    let aborted = eventually(|| {
        harness
            .backend
            .aborted()
            .is_ok_and(|sessions| sessions == vec![SessionId::new("ses_0001")])
    })
    .await;
    assert!(aborted, "session abort was never requested");

    harness.backend.release_prompts();
    assert_eq!(harness.text(buffer), "print(1)");
    assert_eq!(
        harness.events.statuses_for(task_id),
        vec![TaskStatus::Running, TaskStatus::Cancelled]
    );
}

#[rstest]
#[tokio::test]
async fn cancelling_a_finished_task_changes_nothing(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.reply("print(2)");
    let service = harness.service(EditConfig::default());

    let task = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted")
        .wait()
        .await
        .expect("pipeline finished");

    assert!(!service.cancel(task.id()).expect("cancel succeeds"));
    let stored = service
        .find(task.id())
        .expect("query succeeds")
        .expect("task kept");
    assert_outcome(&stored, TaskStatus::Completed);
    assert!(harness.backend.aborted().expect("aborts readable").is_empty());
}

#[rstest]
#[tokio::test]
async fn pending_task_cancelled_before_execution_never_reaches_the_backend(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    let service = harness.service(EditConfig::default());

    let task = service
        .create_task(request(buffer, 1, 1, "print two"))
        .expect("task created");
    assert!(service.cancel(task.id()).expect("cancel succeeds"));
    let executed = service.execute(task.id()).await.expect("execute returns");

    assert_outcome(&executed, TaskStatus::Cancelled);
    assert!(harness.backend.sessions().expect("sessions readable").is_empty());
    assert!(harness.backend.aborted().expect("aborts readable").is_empty());
}

#[rstest]
#[tokio::test]
async fn cancel_all_stops_every_running_task(harness: Harness) {
    let first = harness.open("lua", "print(1)");
    let second = harness.open("lua", "print(2)");
    harness.backend.hold_prompts();
    let service = harness.service(EditConfig::default());

    let handles = [
        service.submit(request(first, 1, 1, "a")).expect("submitted"),
        service.submit(request(second, 1, 1, "b")).expect("submitted"),
    ];
    wait_for_prompts(&harness.backend, 2).await;

    assert_eq!(service.cancel_all().expect("cancel succeeds"), 2);
    for handle in handles {
        let task = handle.wait().await.expect("pipeline finished");
        assert_outcome(&task, TaskStatus::Cancelled);
    }
    assert!(service.active_tasks().expect("query succeeds").is_empty());
}

#[rstest]
#[tokio::test]
async fn shutdown_cancels_and_refuses_new_work(harness: Harness) {
    let buffer = harness.open("lua", "print(1)");
    harness.backend.hold_prompts();
    let service = harness.service(EditConfig::default());

    let handle = service
        .submit(request(buffer, 1, 1, "print two"))
        .expect("task submitted");
    wait_for_prompts(&harness.backend, 1).await;

    assert_eq!(service.shutdown().expect("shutdown succeeds"), 1);
    let task = handle.wait().await.expect("pipeline finished");
    assert_outcome(&task, TaskStatus::Cancelled);
    assert_eq!(
        task.error().map(|error| error.message.as_str()),
        Some("cancelled on shutdown")
    );

    let refused = service.submit(request(buffer, 1, 1, "again"));
    assert!(matches!(refused, Err(EditLifecycleError::ShutDown)));
}
