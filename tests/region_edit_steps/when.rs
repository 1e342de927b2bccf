//! When steps for region edit BDD scenarios.

use std::time::Duration;

use super::world::{RegionEditWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use scrivener::edit::{domain::Region, services::SubmitEditRequest};

#[when(r#"the user asks to "{instruction}" on line {line:usize}"#)]
fn user_submits(
    world: &mut RegionEditWorld,
    instruction: String,
    line: usize,
) -> Result<(), eyre::Report> {
    let region = Region::whole_lines(world.buffer()?, line, line)?;
    let handle = world
        .build_service()?
        .submit(SubmitEditRequest::new(region, instruction))
        .wrap_err("submit edit request")?;
    world.pending = Some(handle);
    Ok(())
}

#[when(r#"the user changes line {line:usize} to "{text}" while the request is in flight"#)]
fn user_edits_in_flight(
    world: &mut RegionEditWorld,
    line: usize,
    text: String,
) -> Result<(), eyre::Report> {
    let backend = &world.backend;
    let arrived = run_async(async {
        for _ in 0..400 {
            if backend.prompts().is_ok_and(|prompts| !prompts.is_empty()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    });
    eyre::ensure!(arrived, "backend never received the prompt");

    let index = line
        .checked_sub(1)
        .ok_or_else(|| eyre::eyre!("lines are numbered from 1"))?;
    world
        .document
        .set_line(world.buffer()?, index, &text)
        .wrap_err("apply user edit")?;
    world.backend.release_prompts();
    Ok(())
}
