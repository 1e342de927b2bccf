//! Port contracts for region edit orchestration.
//!
//! Ports define infrastructure-agnostic interfaces used by the edit
//! services: the task registry, the live document, the review gate, and the
//! UI event sink.

pub mod document;
pub mod events;
pub mod registry;
pub mod review;

pub use document::{DocumentError, DocumentPort, DocumentResult};
pub use events::{EditEvent, EditEventSink};
pub use registry::{TaskRegistry, TaskRegistryError, TaskRegistryResult};
pub use review::{ReviewDecision, ReviewGate};
