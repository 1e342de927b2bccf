//! Lifecycle controller driving edit tasks through their state machine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{
    domain::{ModelSpec, SessionId},
    ports::{AgentBackend, BackendError},
    services::wait_until_ready,
};
use crate::config::{ConfigError, EditConfig};
use crate::edit::{
    domain::{
        BufferId, DirectiveSyntax, EditTask, ErrorInfo, ErrorKind, LanguageFamily, Region,
        Snapshot, TaskId,
    },
    ports::{DocumentPort, EditEventSink, ReviewGate, TaskRegistry},
};

use super::{
    ApplyEngine, EditLifecycleError, EditLifecycleResult, PromptContext, PromptRenderer,
    parse_response,
    transitions::{Settled, TaskTransitions},
};

/// Request payload for a new region edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEditRequest {
    region: Region,
    prompt: String,
}

impl SubmitEditRequest {
    /// Creates a request to rewrite `region` according to `prompt`.
    #[must_use]
    pub fn new(region: Region, prompt: impl Into<String>) -> Self {
        Self {
            region,
            prompt: prompt.into(),
        }
    }

    /// Returns the target region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Returns the edit instruction.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Handle to a task pipeline running in the background.
#[derive(Debug)]
pub struct EditHandle {
    task_id: TaskId,
    join: JoinHandle<EditLifecycleResult<EditTask>>,
}

impl EditHandle {
    /// Returns the identifier of the submitted task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Waits for the pipeline and returns the task in its final state.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's own error, or
    /// [`EditLifecycleError::PipelineAborted`] when the spawned pipeline
    /// panicked or was aborted.
    pub async fn wait(self) -> EditLifecycleResult<EditTask> {
        let task_id = self.task_id;
        self.join
            .await
            .map_err(|err| EditLifecycleError::PipelineAborted {
                task_id,
                reason: err.to_string(),
            })?
    }
}

#[derive(Debug, Clone)]
struct Flight {
    token: CancellationToken,
    started: bool,
}

enum FlightStart {
    Run(EditTask, CancellationToken),
    Finished(EditTask),
}

/// Edit task orchestration service.
///
/// Every task runs one pipeline: readiness gate, session creation, a single
/// prompt, response parsing, then the [`ApplyEngine`]. The backend prompt
/// and the review gate are raced against the task's cancellation token, so
/// [`EditLifecycleService::cancel`] stops local progress immediately. Any
/// number of pipelines may run at once; they share only the registry.
pub struct EditLifecycleService<R, D, B, G, E, C> {
    transitions: TaskTransitions<R, E, C>,
    document: Arc<D>,
    backend: Arc<B>,
    apply: ApplyEngine<R, D, G, E, C>,
    config: Arc<EditConfig>,
    model: Option<ModelSpec>,
    prompts: PromptRenderer,
    flights: Arc<Mutex<HashMap<TaskId, Flight>>>,
    closed: Arc<AtomicBool>,
}

impl<R, D, B, G, E, C> Clone for EditLifecycleService<R, D, B, G, E, C> {
    fn clone(&self) -> Self {
        Self {
            transitions: self.transitions.clone(),
            document: Arc::clone(&self.document),
            backend: Arc::clone(&self.backend),
            apply: self.apply.clone(),
            config: Arc::clone(&self.config),
            model: self.model.clone(),
            prompts: self.prompts.clone(),
            flights: Arc::clone(&self.flights),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl<R, D, B, G, E, C> EditLifecycleService<R, D, B, G, E, C>
where
    R: TaskRegistry + 'static,
    D: DocumentPort + 'static,
    B: AgentBackend + 'static,
    G: ReviewGate + 'static,
    E: EditEventSink + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a lifecycle service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(
        registry: Arc<R>,
        document: Arc<D>,
        backend: Arc<B>,
        review: Arc<G>,
        events: Arc<E>,
        clock: Arc<C>,
        config: EditConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let model = config.model_spec()?;
        let prompts = PromptRenderer::new(config.prompt_template.clone());
        let shared_config = Arc::new(config);
        let apply = ApplyEngine::new(
            Arc::clone(&registry),
            Arc::clone(&document),
            review,
            Arc::clone(&events),
            Arc::clone(&clock),
            Arc::clone(&shared_config),
        );
        Ok(Self {
            transitions: TaskTransitions::new(registry, events, clock),
            document,
            backend,
            apply,
            config: shared_config,
            model,
            prompts,
            flights: Arc::new(Mutex::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Snapshots the request's region and registers a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`EditLifecycleError::ShutDown`] after [`Self::shutdown`],
    /// [`EditLifecycleError::Document`] when the region cannot be read, and
    /// [`EditLifecycleError::Domain`] for a blank instruction.
    pub fn create_task(&self, request: SubmitEditRequest) -> EditLifecycleResult<EditTask> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EditLifecycleError::ShutDown);
        }
        let SubmitEditRequest { region, prompt } = request;
        let snapshot = Snapshot::new(self.document.region_text(&region)?);
        let task = EditTask::new(region, snapshot, prompt, self.transitions.clock())?;
        self.flights().insert(
            task.id(),
            Flight {
                token: CancellationToken::new(),
                started: false,
            },
        );
        let events = self.transitions.events();
        if let Err(err) = self
            .transitions
            .registry()
            .insert_and_notify(task.clone(), |stored| events.on_task_created(stored))
        {
            self.forget(task.id());
            return Err(err.into());
        }
        tracing::info!(task_id = %task.id(), %region, "edit task created");
        Ok(task)
    }

    /// Creates a task and runs its pipeline on the current Tokio runtime.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::create_task`].
    pub fn submit(&self, request: SubmitEditRequest) -> EditLifecycleResult<EditHandle> {
        let task = self.create_task(request)?;
        let task_id = task.id();
        let service = self.clone();
        let join = tokio::spawn(async move { service.execute(task_id).await });
        Ok(EditHandle { task_id, join })
    }

    /// Runs the pipeline of a pending task to its terminal state.
    ///
    /// A task that is already terminal, for example one cancelled before it
    /// started, is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EditLifecycleError::AlreadyExecuting`] when the pipeline
    /// was started before, [`EditLifecycleError::NotFound`] for unknown
    /// tasks, and registry errors. Pipeline failures are recorded on the
    /// returned task.
    #[tracing::instrument(skip_all, fields(task_id = %task_id))]
    pub async fn execute(&self, task_id: TaskId) -> EditLifecycleResult<EditTask> {
        let (task, token) = match self.start_flight(task_id)? {
            FlightStart::Finished(task) => return Ok(task),
            FlightStart::Run(task, token) => (task, token),
        };
        let outcome = self.run_pipeline(task, &token).await;
        self.forget(task_id);
        outcome
    }

    /// Cancels a pending or running task.
    ///
    /// Returns `false` without changing anything when the task is terminal
    /// or already claimed by the apply engine. A backend abort is issued in
    /// the background when a session exists; its outcome never affects the
    /// task.
    ///
    /// # Errors
    ///
    /// Returns [`EditLifecycleError::NotFound`] for unknown tasks.
    pub fn cancel(&self, task_id: TaskId) -> EditLifecycleResult<bool> {
        self.cancel_with(
            task_id,
            ErrorInfo::new(ErrorKind::UserCancelled, "cancelled by user"),
        )
    }

    /// Cancels every active task and returns how many were cancelled.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn cancel_all(&self) -> EditLifecycleResult<usize> {
        self.cancel_active("cancelled by user")
    }

    /// Stops accepting tasks and cancels every active one.
    ///
    /// Returns how many tasks were cancelled.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn shutdown(&self) -> EditLifecycleResult<usize> {
        self.closed.store(true, Ordering::Release);
        let cancelled = self.cancel_active("cancelled on shutdown")?;
        tracing::info!(cancelled, "edit service shut down");
        Ok(cancelled)
    }

    /// Removes a terminal task from the registry and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`EditLifecycleError::TaskStillActive`] for pending or
    /// running tasks and [`EditLifecycleError::NotFound`] for unknown ones.
    pub fn cleanup(&self, task_id: TaskId) -> EditLifecycleResult<EditTask> {
        let task = self.transitions.current(task_id)?;
        if task.status().is_active() {
            return Err(EditLifecycleError::TaskStillActive(task_id));
        }
        self.transitions.registry().remove(task_id)?;
        self.forget(task_id);
        Ok(task)
    }

    /// Removes every terminal task and returns how many were removed.
    ///
    /// Cancellation state kept for tasks that are no longer active is
    /// dropped as well.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn purge_terminal(&self) -> EditLifecycleResult<usize> {
        let registry = self.transitions.registry();
        let purged = registry.purge_terminal()?;
        let active: HashSet<TaskId> = registry.find_active()?.iter().map(EditTask::id).collect();
        self.flights().retain(|task_id, _| active.contains(task_id));
        tracing::debug!(purged, "terminal tasks purged");
        Ok(purged)
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn find(&self, task_id: TaskId) -> EditLifecycleResult<Option<EditTask>> {
        Ok(self.transitions.registry().get(task_id)?)
    }

    /// Returns every task targeting `buffer`.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn tasks_for_buffer(&self, buffer: BufferId) -> EditLifecycleResult<Vec<EditTask>> {
        Ok(self.transitions.registry().find_by_buffer(buffer)?)
    }

    /// Returns every pending or running task.
    ///
    /// # Errors
    ///
    /// Returns registry errors.
    pub fn active_tasks(&self) -> EditLifecycleResult<Vec<EditTask>> {
        Ok(self.transitions.registry().find_active()?)
    }

    async fn run_pipeline(
        &self,
        task: EditTask,
        token: &CancellationToken,
    ) -> EditLifecycleResult<EditTask> {
        let task_id = task.id();
        let filetype = self
            .document
            .filetype(task.region().buffer())
            .ok()
            .flatten();
        let prompt = match self
            .prompts
            .render(&PromptContext::for_task(&task, filetype.as_deref()))
        {
            Ok(prompt) => prompt,
            Err(err) => {
                return self
                    .transitions
                    .fail(task_id, ErrorInfo::new(ErrorKind::BackendRejected, err.to_string()));
            }
        };

        if self.config.readiness.enabled {
            let readiness = tokio::select! {
                () = token.cancelled() => return self.transitions.current(task_id),
                readiness = wait_until_ready(&*self.backend, &self.config.readiness) => readiness,
            };
            if let Err(err) = readiness {
                return self.backend_failed(task_id, &err);
            }
        }

        // Not raced with cancellation: the session id is needed to abort.
        let session = match self.backend.create_session().await {
            Ok(session) => session,
            Err(err) => return self.backend_failed(task_id, &err),
        };
        let marked = self
            .transitions
            .settle(task_id, |stored, clock| stored.mark_running(session.clone(), clock))?;
        if let Settled::Refused(current) = marked {
            self.abort_in_background(session);
            return Ok(current);
        }
        tracing::debug!(%session, "backend session created");

        let outcome = tokio::select! {
            () = token.cancelled() => return self.transitions.current(task_id),
            outcome = self.backend.send_prompt(&session, &prompt, self.model.clone()) => outcome,
        };
        let reply = match outcome {
            Ok(reply) => reply,
            Err(err) => return self.backend_failed(task_id, &err),
        };

        let family = filetype
            .as_deref()
            .map_or(LanguageFamily::Unknown, LanguageFamily::from_filetype);
        let syntax =
            DirectiveSyntax::default().with_tokens(family.comment_tokens().iter().copied());
        let proposal = match parse_response(&reply, &syntax) {
            Ok(proposal) => proposal,
            Err(info) => return self.transitions.fail(task_id, info),
        };
        tracing::debug!(
            lines = proposal.body_lines().len(),
            imports = proposal.auxiliary.is_some(),
            "backend response parsed"
        );
        self.apply.apply(task_id, &proposal, token).await
    }

    fn backend_failed(&self, task_id: TaskId, err: &BackendError) -> EditLifecycleResult<EditTask> {
        tracing::warn!(task_id = %task_id, error = %err, "backend call failed");
        self.transitions
            .fail(task_id, ErrorInfo::new(ErrorKind::BackendRejected, err.to_string()))
    }

    fn cancel_active(&self, reason: &str) -> EditLifecycleResult<usize> {
        let mut cancelled = 0;
        for task in self.transitions.registry().find_active()? {
            let cause = ErrorInfo::new(ErrorKind::UserCancelled, reason);
            if self.cancel_with(task.id(), cause)? {
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    fn cancel_with(&self, task_id: TaskId, cause: ErrorInfo) -> EditLifecycleResult<bool> {
        let Settled::Changed(task) = self.transitions.cancel(task_id, cause)? else {
            return Ok(false);
        };
        let token = {
            let mut flights = self.flights();
            let started = flights.get(&task_id).is_some_and(|flight| flight.started);
            if started {
                flights.get(&task_id).map(|flight| flight.token.clone())
            } else {
                flights.remove(&task_id).map(|flight| flight.token)
            }
        };
        if let Some(flight_token) = token {
            flight_token.cancel();
        }
        if let Some(session) = task.session() {
            self.abort_in_background(session.clone());
        }
        Ok(true)
    }

    fn abort_in_background(&self, session: SessionId) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(%session, "no async runtime; backend abort skipped");
            return;
        };
        let backend = Arc::clone(&self.backend);
        runtime.spawn(async move {
            match backend.abort_session(&session).await {
                Ok(()) => tracing::debug!(%session, "backend session aborted"),
                Err(err) => tracing::warn!(%session, error = %err, "backend abort failed"),
            }
        });
    }

    fn start_flight(&self, task_id: TaskId) -> EditLifecycleResult<FlightStart> {
        let mut flights = self.flights();
        // A cancel commits to the registry before it takes the flights lock,
        // so reading the task under that lock cannot miss it.
        let task = self.transitions.current(task_id)?;
        if task.status().is_terminal() {
            if flights.get(&task_id).is_some_and(|flight| !flight.started) {
                flights.remove(&task_id);
            }
            return Ok(FlightStart::Finished(task));
        }
        let flight = flights.entry(task_id).or_insert_with(|| Flight {
            token: CancellationToken::new(),
            started: false,
        });
        if flight.started {
            return Err(EditLifecycleError::AlreadyExecuting(task_id));
        }
        flight.started = true;
        Ok(FlightStart::Run(task, flight.token.clone()))
    }

    #[cfg(test)]
    pub(crate) fn tracked_flights(&self) -> usize {
        self.flights().len()
    }

    fn forget(&self, task_id: TaskId) {
        self.flights().remove(&task_id);
    }

    fn flights(&self) -> MutexGuard<'_, HashMap<TaskId, Flight>> {
        // Only tokens live here; a poisoned map is still consistent.
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
