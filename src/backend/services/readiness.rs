//! Bounded readiness polling for backend startup.
//!
//! Readiness gating belongs to the connection bootstrap, not to individual
//! edit tasks. The lifecycle service calls it once per task before creating a
//! session when the policy is enabled.

use crate::backend::ports::{AgentBackend, BackendError, BackendResult};
use crate::config::ReadinessPolicy;

/// Polls `backend` until it reports ready or the policy is exhausted.
///
/// Errors from individual readiness checks count as "not ready yet", since a
/// starting backend commonly refuses connections.
///
/// # Errors
///
/// Returns [`BackendError::Timeout`] when every permitted check reported the
/// backend as not ready.
pub async fn wait_until_ready<B>(backend: &B, policy: &ReadinessPolicy) -> BackendResult<()>
where
    B: AgentBackend + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match backend.is_ready().await {
            Ok(true) => {
                tracing::debug!(attempt, "backend ready");
                return Ok(());
            }
            Ok(false) => tracing::debug!(attempt, "backend not ready yet"),
            Err(error) => tracing::debug!(attempt, %error, "backend readiness check failed"),
        }
        if attempt < attempts {
            tokio::time::sleep(policy.interval()).await;
        }
    }
    tracing::warn!(attempts, "backend did not become ready");
    Err(BackendError::Timeout { attempts })
}
