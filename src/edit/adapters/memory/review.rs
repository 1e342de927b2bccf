//! Review gate adapters.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::edit::{
    domain::EditTask,
    ports::{ReviewDecision, ReviewGate},
};

/// Gate that answers every review with a fixed decision.
#[derive(Debug, Clone, Copy)]
pub struct StaticReviewGate {
    decision: ReviewDecision,
}

impl StaticReviewGate {
    /// Gate that accepts every proposal.
    #[must_use]
    pub const fn accept_all() -> Self {
        Self {
            decision: ReviewDecision::Accepted,
        }
    }

    /// Gate that rejects every proposal.
    #[must_use]
    pub const fn reject_all() -> Self {
        Self {
            decision: ReviewDecision::Rejected,
        }
    }
}

impl Default for StaticReviewGate {
    fn default() -> Self {
        Self::accept_all()
    }
}

#[async_trait]
impl ReviewGate for StaticReviewGate {
    async fn review(&self, _task: &EditTask, _proposed_text: &str) -> ReviewDecision {
        self.decision
    }
}

/// A pending review delivered to the UI.
///
/// Dropping the request without answering counts as a rejection.
#[derive(Debug)]
pub struct ReviewRequest {
    task: EditTask,
    proposed_text: String,
    responder: oneshot::Sender<ReviewDecision>,
}

impl ReviewRequest {
    /// Task whose result is under review.
    #[must_use]
    pub const fn task(&self) -> &EditTask {
        &self.task
    }

    /// Replacement text proposed for the task's region.
    #[must_use]
    pub fn proposed_text(&self) -> &str {
        &self.proposed_text
    }

    /// Answers the review.
    pub fn decide(self, decision: ReviewDecision) {
        if self.responder.send(decision).is_err() {
            tracing::debug!(task_id = %self.task.id(), "review no longer awaited");
        }
    }

    /// Accepts the proposal.
    pub fn accept(self) {
        self.decide(ReviewDecision::Accepted);
    }

    /// Rejects the proposal.
    pub fn reject(self) {
        self.decide(ReviewDecision::Rejected);
    }
}

/// Gate that forwards each review to a UI over a channel.
#[derive(Debug, Clone)]
pub struct ChannelReviewGate {
    sender: mpsc::UnboundedSender<ReviewRequest>,
}

impl ChannelReviewGate {
    /// Creates a gate and the receiver on which review requests arrive.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReviewRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ReviewGate for ChannelReviewGate {
    async fn review(&self, task: &EditTask, proposed_text: &str) -> ReviewDecision {
        let (responder, decision) = oneshot::channel();
        let request = ReviewRequest {
            task: task.clone(),
            proposed_text: proposed_text.to_owned(),
            responder,
        };
        if self.sender.send(request).is_err() {
            tracing::warn!(task_id = %task.id(), "review receiver dropped; rejecting");
            return ReviewDecision::Rejected;
        }
        decision.await.unwrap_or(ReviewDecision::Rejected)
    }
}
