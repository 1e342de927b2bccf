//! Orchestration services for region edit tasks.
//!
//! [`EditLifecycleService`] is the entry point. It owns the per-task
//! pipeline and delegates the final stage to [`ApplyEngine`]. The parsing,
//! conflict, and import placement helpers are pure functions exported for
//! hosts that need them directly.

mod apply;
mod conflict;
mod error;
mod imports;
mod lifecycle;
mod prompt;
mod response;
mod transitions;

pub use apply::ApplyEngine;
pub use conflict::{RegionObservation, has_conflict, observe_region};
pub use error::{EditLifecycleError, EditLifecycleResult};
pub use imports::{find_import_insertion_line, pending_import_lines};
pub use lifecycle::{EditHandle, EditLifecycleService, SubmitEditRequest};
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptContext, PromptError, PromptRenderer};
pub use response::parse_response;
