//! Domain model for region edit tasks.
//!
//! Regions, snapshots, the task aggregate and its state machine, parsed
//! backend proposals, and per-language import conventions. Document and
//! backend access stay outside the domain boundary.

mod error;
mod ids;
mod language;
mod proposal;
mod region;
mod task;

pub use error::{EditDomainError, ParseTaskStatusError};
pub use ids::{BufferId, TaskId};
pub use language::LanguageFamily;
pub use proposal::{DirectiveSyntax, ParsedResponse};
pub use region::{Region, Snapshot};
pub use task::{EditTask, ErrorInfo, ErrorKind, TaskStatus};
