//! Independent and overlapping tasks.

use super::helpers::{Harness, assert_outcome, harness, request};
use rstest::rstest;
use scrivener::config::{ConflictPolicy, EditConfig};
use scrivener::edit::domain::{ErrorKind, TaskStatus};

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_tasks_on_separate_buffers_all_complete(harness: Harness) {
    let buffers: Vec<_> = (0..8)
        .map(|index| harness.open("lua", &format!("print({index})")))
        .collect();
    for _ in &buffers {
        harness.reply("print('done')");
    }
    let service = harness.service(EditConfig::default());

    let handles: Vec<_> = buffers
        .iter()
        .map(|buffer| {
            service
                .submit(request(*buffer, 1, 1, "finish"))
                .expect("task submitted")
        })
        .collect();
    for handle in handles {
        let task = handle.wait().await.expect("pipeline finished");
        assert_outcome(&task, TaskStatus::Completed);
    }

    for buffer in buffers {
        assert_eq!(harness.text(buffer), "print('done')");
    }
    assert_eq!(harness.backend.sessions().expect("sessions readable").len(), 8);
    assert!(service.active_tasks().expect("query succeeds").is_empty());
}

#[rstest]
#[tokio::test]
async fn overlapping_tasks_apply_last_write_wins_with_a_warning(harness: Harness) {
    let buffer = harness.open("lua", "a()\nb()\nc()");
    harness.reply("first()");
    harness.reply("second()");
    let service = harness.service(EditConfig::default());

    let earlier = service
        .create_task(request(buffer, 1, 2, "merge"))
        .expect("task created");
    let later = service
        .create_task(request(buffer, 2, 3, "merge"))
        .expect("task created");
    assert_eq!(service.tasks_for_buffer(buffer).expect("query").len(), 2);

    let first = service.execute(earlier.id()).await.expect("pipeline finished");
    assert_outcome(&first, TaskStatus::Completed);
    assert_eq!(harness.text(buffer), "first()\nc()");

    // The later task's region now runs past the end of the buffer.
    let second = service.execute(later.id()).await.expect("pipeline finished");
    assert_outcome(&second, TaskStatus::Failed);
    assert_eq!(
        second.error().map(|error| error.kind),
        Some(ErrorKind::TargetGone)
    );
}

#[rstest]
#[case::warn(ConflictPolicy::default(), TaskStatus::Completed, "second()\nb()")]
#[case::cancel(
    ConflictPolicy { warn_on_conflict: false, cancel_on_conflict: true },
    TaskStatus::Cancelled,
    "first()\nb()"
)]
#[tokio::test]
async fn same_region_tasks_follow_the_conflict_policy(
    harness: Harness,
    #[case] conflict: ConflictPolicy,
    #[case] expected: TaskStatus,
    #[case] final_text: &str,
) {
    let buffer = harness.open("lua", "a()\nb()");
    harness.reply("first()");
    harness.reply("second()");
    let service = harness.service(EditConfig {
        conflict,
        ..EditConfig::default()
    });

    let earlier = service
        .create_task(request(buffer, 1, 1, "rename"))
        .expect("task created");
    let later = service
        .create_task(request(buffer, 1, 1, "rename"))
        .expect("task created");

    let first = service.execute(earlier.id()).await.expect("pipeline finished");
    assert_outcome(&first, TaskStatus::Completed);
    let second = service.execute(later.id()).await.expect("pipeline finished");
    assert_outcome(&second, expected);

    assert_eq!(harness.text(buffer), final_text);
    let warnings = harness.events.conflict_warnings_for(later.id());
    assert_eq!(warnings, usize::from(expected == TaskStatus::Completed));
}
