//! Snapshot comparison against the live document.

use crate::edit::{domain::EditTask, ports::DocumentPort};

/// What a read of a task's region found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionObservation {
    /// The buffer is gone or the region no longer fits it.
    Gone,
    /// The region reads exactly as the snapshot.
    Unchanged(String),
    /// The region exists but its text differs from the snapshot.
    Changed(String),
}

impl RegionObservation {
    /// Returns the live region text, if the region still exists.
    #[must_use]
    pub fn live_text(&self) -> Option<&str> {
        match self {
            Self::Gone => None,
            Self::Unchanged(text) | Self::Changed(text) => Some(text),
        }
    }
}

/// Reads the task's region and compares it with the snapshot.
pub fn observe_region<D>(document: &D, task: &EditTask) -> RegionObservation
where
    D: DocumentPort + ?Sized,
{
    let region = task.region();
    if !document.buffer_exists(region.buffer()) {
        return RegionObservation::Gone;
    }
    match document.region_text(region) {
        Ok(live) if task.snapshot().matches(&live) => RegionObservation::Unchanged(live),
        Ok(live) => RegionObservation::Changed(live),
        Err(_) => RegionObservation::Gone,
    }
}

/// Returns `true` when the task's region no longer reads exactly as its
/// snapshot.
///
/// A missing buffer, or a region that no longer fits the buffer, is a
/// conflict. The check is a pure read of the document.
pub fn has_conflict<D>(document: &D, task: &EditTask) -> bool
where
    D: DocumentPort + ?Sized,
{
    !matches!(
        observe_region(document, task),
        RegionObservation::Unchanged(_)
    )
}
