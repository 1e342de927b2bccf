//! Apply engine: the final, guarded stage of a task pipeline.

use std::sync::Arc;

use mockable::Clock;
use tokio_util::sync::CancellationToken;

use crate::config::EditConfig;
use crate::edit::{
    domain::{EditTask, ErrorInfo, ErrorKind, LanguageFamily, ParsedResponse, TaskId},
    ports::{
        DocumentPort, EditEventSink, ReviewDecision, ReviewGate, TaskRegistry, TaskRegistryError,
    },
};

use super::{
    EditLifecycleResult, RegionObservation, find_import_insertion_line, observe_region,
    pending_import_lines,
    transitions::{Settled, TaskTransitions},
};

/// Outcome of a target validation gate.
enum Gate {
    /// The pipeline may continue; carries the region text that was read.
    Proceed(String),
    /// The gate finalized the task.
    Stopped(EditTask),
}

/// Validates a parsed proposal against the live document and applies it.
///
/// Each step is a hard gate. A failed gate finalizes the task as `failed`
/// or `cancelled` and leaves the document untouched:
///
/// 1. The target buffer and region still exist.
/// 2. Conflict policy is applied to the snapshot comparison.
/// 3. In review mode the reviewer must accept; steps 1 and 2 then run again.
/// 4. The task is claimed, after which cancellation no longer takes effect.
/// 5. The region's lines are replaced in one document operation, provided
///    the region still reads as it did at the last gate.
///
/// Auxiliary import lines are then inserted best-effort. Their failure is
/// reported as a notice and the task still completes.
pub struct ApplyEngine<R, D, G, E, C> {
    transitions: TaskTransitions<R, E, C>,
    document: Arc<D>,
    review: Arc<G>,
    config: Arc<EditConfig>,
}

impl<R, D, G, E, C> Clone for ApplyEngine<R, D, G, E, C> {
    fn clone(&self) -> Self {
        Self {
            transitions: self.transitions.clone(),
            document: Arc::clone(&self.document),
            review: Arc::clone(&self.review),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, D, G, E, C> ApplyEngine<R, D, G, E, C>
where
    R: TaskRegistry,
    D: DocumentPort,
    G: ReviewGate,
    E: EditEventSink,
    C: Clock + Send + Sync,
{
    /// Creates an apply engine.
    #[must_use]
    pub const fn new(
        registry: Arc<R>,
        document: Arc<D>,
        review: Arc<G>,
        events: Arc<E>,
        clock: Arc<C>,
        config: Arc<EditConfig>,
    ) -> Self {
        Self {
            transitions: TaskTransitions::new(registry, events, clock),
            document,
            review,
            config,
        }
    }

    /// Applies `proposal` to the region of a running task and returns the
    /// task in its final state.
    ///
    /// When `cancellation` fires while the review gate is pending, the task
    /// is returned as stored by the cancelling flow.
    ///
    /// # Errors
    ///
    /// Returns [`EditLifecycleError`](super::EditLifecycleError) when the
    /// task is unknown or the registry fails. Pipeline failures are recorded
    /// on the returned task instead.
    pub async fn apply(
        &self,
        task_id: TaskId,
        proposal: &ParsedResponse,
        cancellation: &CancellationToken,
    ) -> EditLifecycleResult<EditTask> {
        let task = self.transitions.current(task_id)?;
        if task.status().is_terminal() {
            return Ok(task);
        }

        let mut warned = false;
        let mut expected = match self.validate_target(&task, &mut warned)? {
            Gate::Proceed(live) => live,
            Gate::Stopped(stopped) => return Ok(stopped),
        };

        if self.config.review_mode {
            tracing::debug!(task_id = %task_id, "awaiting review decision");
            let decision = tokio::select! {
                () = cancellation.cancelled() => return self.transitions.current(task_id),
                decision = self.review.review(&task, &proposal.body) => decision,
            };
            if decision == ReviewDecision::Rejected {
                return self
                    .transitions
                    .cancel(
                        task_id,
                        ErrorInfo::new(ErrorKind::UserRejected, "proposed edit rejected at review"),
                    )
                    .map(Settled::into_task);
            }
            expected = match self.validate_target(&task, &mut warned)? {
                Gate::Proceed(live) => live,
                Gate::Stopped(stopped) => return Ok(stopped),
            };
        }

        match self
            .transitions
            .registry()
            .modify(task_id, EditTask::claim_apply)
        {
            Ok(_) => {}
            Err(TaskRegistryError::Domain(_)) => return self.transitions.current(task_id),
            Err(err) => return Err(err.into()),
        }

        // The comparison and the write happen under one document lock, so an
        // edit landing after the last gate fails the task instead of being
        // overwritten.
        if let Err(err) =
            self.document
                .replace_region_if(task.region(), &expected, proposal.body_lines())
        {
            tracing::warn!(task_id = %task_id, error = %err, "region replacement failed");
            return self.transitions.fail(
                task_id,
                ErrorInfo::new(
                    ErrorKind::MutationFailed,
                    format!("document mutation failed: {err}"),
                ),
            );
        }

        if let Some(auxiliary) = proposal.auxiliary.as_deref() {
            self.insert_auxiliary(&task, auxiliary);
        }

        let body = proposal.body.clone();
        self.transitions
            .settle(task_id, |stored, clock| stored.complete(body, clock))
            .map(Settled::into_task)
    }

    /// Re-checks the target and applies conflict policy.
    ///
    /// Returns the live region text when the pipeline may continue.
    fn validate_target(&self, task: &EditTask, warned: &mut bool) -> EditLifecycleResult<Gate> {
        let region = task.region();
        let live = match observe_region(&*self.document, task) {
            RegionObservation::Unchanged(live) => return Ok(Gate::Proceed(live)),
            RegionObservation::Changed(live) => live,
            RegionObservation::Gone => {
                return self
                    .transitions
                    .fail(
                        task.id(),
                        ErrorInfo::new(ErrorKind::TargetGone, format!("{region} no longer exists")),
                    )
                    .map(Gate::Stopped);
            }
        };

        let policy = self.config.conflict;
        if policy.cancel_on_conflict {
            return self
                .transitions
                .cancel(
                    task.id(),
                    ErrorInfo::new(ErrorKind::ConflictCancelled, "cancelled due to conflict"),
                )
                .map(|settled| Gate::Stopped(settled.into_task()));
        }
        if policy.warn_on_conflict && !*warned {
            tracing::warn!(
                task_id = %task.id(),
                %region,
                "region changed since snapshot; applying anyway"
            );
            self.transitions.events().on_conflict_warning(task);
            *warned = true;
        }
        Ok(Gate::Proceed(live))
    }

    fn insert_auxiliary(&self, task: &EditTask, auxiliary: &str) {
        let buffer = task.region().buffer();
        let family = self
            .document
            .filetype(buffer)
            .ok()
            .flatten()
            .as_deref()
            .map_or(LanguageFamily::Unknown, LanguageFamily::from_filetype);

        let window = match self
            .document
            .lines(buffer, 0, self.config.import_scan_window)
        {
            Ok(window) => window,
            Err(err) => {
                self.notice(task, &format!("imports not inserted: {err}"));
                return;
            }
        };

        let pending = pending_import_lines(auxiliary, &window);
        if pending.is_empty() {
            self.notice(task, "imports already present");
            return;
        }
        let at = find_import_insertion_line(&window, family);
        let count = pending.len();
        match self.document.insert_lines(buffer, at, pending) {
            Ok(()) => tracing::debug!(task_id = %task.id(), line = at, count, "imports inserted"),
            Err(err) => self.notice(task, &format!("imports not inserted: {err}")),
        }
    }

    fn notice(&self, task: &EditTask, message: &str) {
        tracing::warn!(task_id = %task.id(), message, "auxiliary insertion skipped");
        self.transitions.events().on_notice(task, message);
    }
}
