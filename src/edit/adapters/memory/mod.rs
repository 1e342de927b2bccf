//! In-memory and channel-backed adapters for edit ports.
//!
//! The registry adapter is the production store. The document adapter and
//! static review gate serve tests and headless hosts; the channel adapters
//! connect the core to a UI running on another task or thread.

mod document;
mod events;
mod registry;
mod review;

pub use document::InMemoryDocumentStore;
pub use events::{ChannelEventSink, NoopEventSink, RecordingEventSink};
pub use registry::InMemoryTaskRegistry;
pub use review::{ChannelReviewGate, ReviewRequest, StaticReviewGate};
