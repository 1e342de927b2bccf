//! Session protocol port for the AI backend.

use crate::backend::domain::{BackendResponse, ModelSpec, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Session protocol offered by an AI backend.
///
/// Each call is a single-shot asynchronous wait. Implementations own the
/// transport (HTTP, spawned process, in-memory) and must be safe to call
/// from many tasks at once.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Reports whether the backend is accepting sessions.
    async fn is_ready(&self) -> BackendResult<bool>;

    /// Creates a session and returns its correlation handle.
    async fn create_session(&self) -> BackendResult<SessionId>;

    /// Sends a prompt within a session and waits for the full response.
    async fn send_prompt(
        &self,
        session: &SessionId,
        prompt: &str,
        model: Option<ModelSpec>,
    ) -> BackendResult<BackendResponse>;

    /// Asks the backend to abort any in-flight work for the session.
    ///
    /// Callers treat this as best-effort.
    async fn abort_session(&self, session: &SessionId) -> BackendResult<()>;
}

/// Errors returned by backend adapters.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend is not reachable or not started.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// The backend did not become ready within the configured bound.
    #[error("backend not ready after {attempts} readiness checks")]
    Timeout {
        /// Number of readiness checks performed.
        attempts: u32,
    },

    /// The session handle is unknown to the backend.
    #[error("unknown backend session: {0}")]
    UnknownSession(SessionId),

    /// Transport-layer failure.
    #[error("backend transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
