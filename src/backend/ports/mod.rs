//! Port contracts for the AI backend.
//!
//! Ports define infrastructure-agnostic interfaces used by the edit core.

pub mod agent;

pub use agent::{AgentBackend, BackendError, BackendResult};
