//! Review gate port: the human-in-the-loop checkpoint before mutation.

use crate::edit::domain::EditTask;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Apply the proposed text.
    Accepted,
    /// Discard the proposed text.
    Rejected,
}

/// Asks a reviewer to accept or reject proposed replacement text.
///
/// Each call yields exactly one decision. Timeouts and abandonment are the
/// reviewer's concern; the core waits on the returned future without a
/// deadline.
#[async_trait]
pub trait ReviewGate: Send + Sync {
    /// Requests a decision for `proposed_text` replacing the task's region.
    async fn review(&self, task: &EditTask, proposed_text: &str) -> ReviewDecision;
}
