//! Scripted backend adapter for deterministic orchestration flows.

use crate::backend::{
    domain::{BackendResponse, ModelSpec, SessionId},
    ports::{AgentBackend, BackendError, BackendResult},
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// Prompt captured by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPrompt {
    /// Session the prompt was sent in.
    pub session: SessionId,
    /// Prompt text.
    pub prompt: String,
    /// Model selection, if any.
    pub model: Option<ModelSpec>,
}

/// In-memory backend that replies from a queue of scripted responses.
///
/// Prompts can be held with [`ScriptedBackend::hold_prompts`] so callers can
/// observe tasks while a backend round-trip is outstanding.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    state: Arc<RwLock<ScriptedState>>,
    hold: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct ScriptedState {
    ready_after: u32,
    readiness_checks: u32,
    session_failure: Option<String>,
    abort_failure: Option<String>,
    replies: VecDeque<BackendResult<BackendResponse>>,
    next_session: u64,
    sessions: Vec<SessionId>,
    prompts: Vec<RecordedPrompt>,
    aborted: Vec<SessionId>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(ScriptedState::default())),
            hold: Arc::new(hold),
        }
    }
}

fn lock_error(err: &impl ToString) -> BackendError {
    BackendError::transport(std::io::Error::other(err.to_string()))
}

impl ScriptedBackend {
    /// Creates a ready backend with an empty reply queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, ScriptedState>> {
        self.state.read().map_err(|err| lock_error(&err))
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, ScriptedState>> {
        self.state.write().map_err(|err| lock_error(&err))
    }

    /// Queues a successful reply for the next prompt.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn push_reply(&self, response: BackendResponse) -> BackendResult<()> {
        self.write()?.replies.push_back(Ok(response));
        Ok(())
    }

    /// Queues a failed reply for the next prompt.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn push_error(&self, error: BackendError) -> BackendResult<()> {
        self.write()?.replies.push_back(Err(error));
        Ok(())
    }

    /// Makes every subsequent session creation fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn fail_session_creation(&self, message: impl Into<String>) -> BackendResult<()> {
        self.write()?.session_failure = Some(message.into());
        Ok(())
    }

    /// Makes every subsequent abort fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn fail_aborts(&self, message: impl Into<String>) -> BackendResult<()> {
        self.write()?.abort_failure = Some(message.into());
        Ok(())
    }

    /// Reports not-ready for the first `checks` readiness checks.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_ready_after(&self, checks: u32) -> BackendResult<()> {
        let mut state = self.write()?;
        state.ready_after = checks;
        state.readiness_checks = 0;
        Ok(())
    }

    /// Blocks prompt replies until [`ScriptedBackend::release_prompts`].
    pub fn hold_prompts(&self) {
        self.hold.send_replace(true);
    }

    /// Releases held prompt replies.
    pub fn release_prompts(&self) {
        self.hold.send_replace(false);
    }

    /// Returns the sessions created so far.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn sessions(&self) -> BackendResult<Vec<SessionId>> {
        Ok(self.read()?.sessions.clone())
    }

    /// Returns every prompt received so far.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn prompts(&self) -> BackendResult<Vec<RecordedPrompt>> {
        Ok(self.read()?.prompts.clone())
    }

    /// Returns the sessions an abort was requested for.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn aborted(&self) -> BackendResult<Vec<SessionId>> {
        Ok(self.read()?.aborted.clone())
    }

    /// Returns the number of readiness checks performed.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn readiness_checks(&self) -> BackendResult<u32> {
        Ok(self.read()?.readiness_checks)
    }

    async fn wait_for_release(&self) -> BackendResult<()> {
        let mut receiver = self.hold.subscribe();
        let released = receiver.wait_for(|held| !*held).await.is_ok();
        if released {
            Ok(())
        } else {
            Err(BackendError::Unavailable("scripted backend dropped".to_owned()))
        }
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn is_ready(&self) -> BackendResult<bool> {
        let mut state = self.write()?;
        state.readiness_checks = state.readiness_checks.saturating_add(1);
        Ok(state.readiness_checks > state.ready_after)
    }

    async fn create_session(&self) -> BackendResult<SessionId> {
        let mut state = self.write()?;
        if let Some(message) = &state.session_failure {
            return Err(BackendError::Rejected(message.clone()));
        }
        state.next_session = state.next_session.saturating_add(1);
        let session = SessionId::new(format!("ses_{:04}", state.next_session));
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn send_prompt(
        &self,
        session: &SessionId,
        prompt: &str,
        model: Option<ModelSpec>,
    ) -> BackendResult<BackendResponse> {
        {
            let mut state = self.write()?;
            if !state.sessions.contains(session) {
                return Err(BackendError::UnknownSession(session.clone()));
            }
            state.prompts.push(RecordedPrompt {
                session: session.clone(),
                prompt: prompt.to_owned(),
                model,
            });
        }

        self.wait_for_release().await?;

        self.write()?
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Rejected("no scripted reply queued".to_owned())))
    }

    async fn abort_session(&self, session: &SessionId) -> BackendResult<()> {
        let mut state = self.write()?;
        state.aborted.push(session.clone());
        match &state.abort_failure {
            Some(message) => Err(BackendError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}
