//! Document port: the live, mutable line-editing surface.

use crate::edit::domain::{BufferId, Region};
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Access to the editor's document buffers.
///
/// Line indices on this port are 0-indexed and ranges are end-exclusive,
/// matching common editor buffer APIs. The core never assumes exclusive
/// access: the user may edit any buffer between two calls.
pub trait DocumentPort: Send + Sync {
    /// Returns `true` when the buffer exists and is loaded.
    fn buffer_exists(&self, buffer: BufferId) -> bool;

    /// Returns the number of lines in the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers.
    fn line_count(&self, buffer: BufferId) -> DocumentResult<usize>;

    /// Returns the declared filetype of the buffer, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers.
    fn filetype(&self, buffer: BufferId) -> DocumentResult<Option<String>>;

    /// Returns the current text of `region`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers and
    /// [`DocumentError::LineOutOfRange`] when the region no longer fits.
    fn region_text(&self, region: &Region) -> DocumentResult<String>;

    /// Returns lines `start..end` (clamped to the buffer length).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers.
    fn lines(&self, buffer: BufferId, start: usize, end: usize) -> DocumentResult<Vec<String>>;

    /// Replaces lines `start..end_exclusive` with `lines` as one atomic
    /// operation.
    ///
    /// On error the buffer must be left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the buffer is gone, the range is out
    /// of bounds, or the surface refuses the edit.
    fn replace_lines(
        &self,
        buffer: BufferId,
        start: usize,
        end_exclusive: usize,
        lines: Vec<String>,
    ) -> DocumentResult<()>;

    /// Replaces the whole lines spanned by `region` with `lines`, provided
    /// the region still reads `expected`.
    ///
    /// The comparison and the write are one atomic operation, so an edit
    /// made after the caller last read the region is never overwritten. On
    /// error the buffer must be left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::RegionChanged`] when the region text differs
    /// from `expected`, and the errors of [`DocumentPort::replace_lines`].
    fn replace_region_if(
        &self,
        region: &Region,
        expected: &str,
        lines: Vec<String>,
    ) -> DocumentResult<()>;

    /// Inserts `lines` before line `at`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the buffer is gone, `at` is past the
    /// end, or the surface refuses the edit.
    fn insert_lines(&self, buffer: BufferId, at: usize, lines: Vec<String>) -> DocumentResult<()>;
}

/// Errors returned by document adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The buffer does not exist.
    #[error("buffer {0} not found")]
    BufferNotFound(BufferId),

    /// A line index is outside the buffer.
    #[error("line {line} out of range for buffer {buffer} ({line_count} lines)")]
    LineOutOfRange {
        /// Buffer identifier.
        buffer: BufferId,
        /// Offending 0-indexed line.
        line: usize,
        /// Current buffer length.
        line_count: usize,
    },

    /// The region no longer reads as the caller last observed it.
    #[error("region of buffer {0} changed before the edit was written")]
    RegionChanged(BufferId),

    /// The editing surface refused the change.
    #[error("document rejected edit: {0}")]
    Rejected(String),
}
