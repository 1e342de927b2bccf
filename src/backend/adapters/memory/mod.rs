//! In-memory backend adapters.
//!
//! These adapters answer prompts from a script instead of a live service,
//! which keeps orchestration tests deterministic.

mod scripted;

pub use scripted::{RecordedPrompt, ScriptedBackend};
