//! Edit task aggregate root and its lifecycle state machine.

use super::{EditDomainError, ParseTaskStatusError, Region, Snapshot, TaskId};
use crate::backend::domain::SessionId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edit task lifecycle status.
///
/// `pending -> running -> {completed | failed | cancelled}`, with `pending`
/// also able to fail or be cancelled directly. The three right-hand states
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task exists but the backend has not accepted it yet.
    Pending,
    /// The backend accepted the request and returned a session handle.
    Running,
    /// The result was applied to the document.
    Completed,
    /// The task ended on an error path.
    Failed,
    /// The task was cancelled by the user, by conflict policy, or at review.
    Cancelled,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` for `pending` and `running`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Returns `true` when the state machine permits `self -> target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Running | Self::Failed | Self::Cancelled
            ) | (
                Self::Running,
                Self::Completed | Self::Failed | Self::Cancelled
            )
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Category of a task failure or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend returned nothing usable.
    NoContent,
    /// The response parsed to an empty body.
    EmptyBody,
    /// The target document or region no longer exists.
    TargetGone,
    /// Conflict policy cancelled the task.
    ConflictCancelled,
    /// The reviewer rejected the proposed text.
    UserRejected,
    /// The user cancelled the task.
    UserCancelled,
    /// The document mutation primitive failed.
    MutationFailed,
    /// Session creation, readiness, or the prompt call failed.
    BackendRejected,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoContent => "no_content",
            Self::EmptyBody => "empty_body",
            Self::TargetGone => "target_gone",
            Self::ConflictCancelled => "conflict_cancelled",
            Self::UserRejected => "user_rejected",
            Self::UserCancelled => "user_cancelled",
            Self::MutationFailed => "mutation_failed",
            Self::BackendRejected => "backend_rejected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause recorded on every failed or cancelled task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl ErrorInfo {
    /// Creates an error record.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One user-submitted edit request and its tracked lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTask {
    id: TaskId,
    region: Region,
    snapshot: Snapshot,
    prompt: String,
    status: TaskStatus,
    session: Option<SessionId>,
    result_text: Option<String>,
    error: Option<ErrorInfo>,
    apply_claimed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EditTask {
    /// Creates a pending task over a captured region.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::EmptyPrompt`] when the instruction is
    /// blank.
    pub fn new(
        region: Region,
        snapshot: Snapshot,
        prompt: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, EditDomainError> {
        let prompt_text = prompt.into();
        if prompt_text.trim().is_empty() {
            return Err(EditDomainError::EmptyPrompt);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            region,
            snapshot,
            prompt: prompt_text,
            status: TaskStatus::Pending,
            session: None,
            result_text: None,
            error: None,
            apply_claimed: false,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the target region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Returns the region text captured at creation.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Returns the user's edit instruction.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the backend session handle, once the backend accepted the task.
    #[must_use]
    pub const fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Returns the applied text of a completed task.
    #[must_use]
    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    /// Returns the cause of a failed or cancelled task.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Returns `true` once the apply engine has claimed the task.
    #[must_use]
    pub const fn is_apply_claimed(&self) -> bool {
        self.apply_claimed
    }

    /// Returns `true` when a cancellation would still take effect.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.status.is_active() && !self.apply_claimed
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records the backend session and moves the task to `running`.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::SessionAlreadyAssigned`] when a session is
    /// already recorded, or [`EditDomainError::InvalidStateTransition`] when
    /// the task is not pending.
    pub fn mark_running(
        &mut self,
        session: SessionId,
        clock: &impl Clock,
    ) -> Result<(), EditDomainError> {
        if self.session.is_some() {
            return Err(EditDomainError::SessionAlreadyAssigned(self.id));
        }
        self.transition_to(TaskStatus::Running, clock)?;
        self.session = Some(session);
        Ok(())
    }

    /// Claims a running task for the document mutation.
    ///
    /// After a successful claim the task can no longer be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::ApplyAlreadyClaimed`] on a second claim, or
    /// [`EditDomainError::InvalidStateTransition`] when the task is not
    /// running.
    pub fn claim_apply(&mut self) -> Result<(), EditDomainError> {
        if self.status != TaskStatus::Running {
            return Err(EditDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: TaskStatus::Completed,
            });
        }
        if self.apply_claimed {
            return Err(EditDomainError::ApplyAlreadyClaimed(self.id));
        }
        self.apply_claimed = true;
        Ok(())
    }

    /// Moves the task to `completed`, storing the applied text.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::InvalidStateTransition`] when the task is
    /// not running.
    pub fn complete(
        &mut self,
        result_text: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), EditDomainError> {
        self.transition_to(TaskStatus::Completed, clock)?;
        self.result_text = Some(result_text.into());
        Ok(())
    }

    /// Moves the task to `failed`, recording the cause.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::InvalidStateTransition`] when the task is
    /// already terminal.
    pub fn fail(&mut self, error: ErrorInfo, clock: &impl Clock) -> Result<(), EditDomainError> {
        self.transition_to(TaskStatus::Failed, clock)?;
        self.error = Some(error);
        Ok(())
    }

    /// Moves the task to `cancelled`, recording the cause.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::ApplyAlreadyClaimed`] once the apply engine
    /// owns the task, or [`EditDomainError::InvalidStateTransition`] when the
    /// task is already terminal.
    pub fn cancel(&mut self, error: ErrorInfo, clock: &impl Clock) -> Result<(), EditDomainError> {
        if self.apply_claimed && self.status.is_active() {
            return Err(EditDomainError::ApplyAlreadyClaimed(self.id));
        }
        self.transition_to(TaskStatus::Cancelled, clock)?;
        self.error = Some(error);
        Ok(())
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), EditDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(EditDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = clock.utc();
        Ok(())
    }
}
