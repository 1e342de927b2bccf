//! Then steps for region edit BDD scenarios.

use super::world::{RegionEditWorld, run_async, unescape};
use rstest_bdd_macros::then;
use scrivener::edit::domain::{EditTask, TaskStatus};

fn outcome(world: &mut RegionEditWorld) -> Result<&EditTask, eyre::Report> {
    if let Some(handle) = world.pending.take() {
        let task = run_async(handle.wait())?;
        world.outcome = Some(task);
    }
    world
        .outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no task was submitted in this scenario"))
}

#[then(r#"the task ends "{status}""#)]
fn task_ends(world: &mut RegionEditWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = outcome(world)?;
    eyre::ensure!(
        task.status() == expected,
        "expected status {expected}, found {} ({:?})",
        task.status(),
        task.error()
    );
    Ok(())
}

#[then(r#"the task result is "{text}""#)]
fn task_result_is(world: &mut RegionEditWorld, text: String) -> Result<(), eyre::Report> {
    let expected = unescape(&text);
    let task = outcome(world)?;
    eyre::ensure!(
        task.result_text() == Some(expected.as_str()),
        "expected result {expected:?}, found {:?}",
        task.result_text()
    );
    Ok(())
}

#[then(r#"the task error kind is "{kind}""#)]
fn task_error_kind_is(world: &mut RegionEditWorld, kind: String) -> Result<(), eyre::Report> {
    let task = outcome(world)?;
    let error = task
        .error()
        .ok_or_else(|| eyre::eyre!("task carries no error"))?;
    eyre::ensure!(
        error.kind.as_str() == kind,
        "expected error kind {kind}, found {}",
        error.kind
    );
    Ok(())
}

#[then(r#"the task error mentions "{needle}""#)]
fn task_error_mentions(world: &mut RegionEditWorld, needle: String) -> Result<(), eyre::Report> {
    let task = outcome(world)?;
    let error = task
        .error()
        .ok_or_else(|| eyre::eyre!("task carries no error"))?;
    eyre::ensure!(
        error.message.contains(&needle),
        "error {error} does not mention {needle:?}"
    );
    Ok(())
}

#[then(r#"the buffer reads "{text}""#)]
fn buffer_reads(world: &mut RegionEditWorld, text: String) -> Result<(), eyre::Report> {
    outcome(world)?;
    let actual = world.document.text(world.buffer()?)?;
    eyre::ensure!(
        actual == unescape(&text),
        "expected buffer {:?}, found {actual:?}",
        unescape(&text)
    );
    Ok(())
}

#[then(r#"a notice mentions "{needle}""#)]
fn notice_mentions(world: &mut RegionEditWorld, needle: String) -> Result<(), eyre::Report> {
    let task_id = outcome(world)?.id();
    let notices = world.events.notices_for(task_id);
    eyre::ensure!(
        notices.iter().any(|notice| notice.contains(&needle)),
        "no notice mentions {needle:?}: {notices:?}"
    );
    Ok(())
}
