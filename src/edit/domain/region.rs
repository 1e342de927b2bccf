//! Document regions and the snapshots captured from them.

use super::{BufferId, EditDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Addressable span of a document buffer.
///
/// Lines and columns are 1-indexed and inclusive. Columns count characters,
/// and an end column past the end of its line selects through the line end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    buffer: BufferId,
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
}

impl Region {
    /// End column selecting through the end of the last line.
    pub const LINE_END: usize = usize::MAX;

    /// Creates a validated region.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::InvalidRegion`] when a bound is zero, the
    /// end line precedes the start line, or a single-line region ends
    /// before it starts.
    pub fn new(
        buffer: BufferId,
        (start_line, start_col): (usize, usize),
        (end_line, end_col): (usize, usize),
    ) -> Result<Self, EditDomainError> {
        if start_line == 0 || start_col == 0 || end_line == 0 || end_col == 0 {
            return Err(EditDomainError::InvalidRegion(
                "lines and columns are 1-indexed".to_owned(),
            ));
        }
        if end_line < start_line {
            return Err(EditDomainError::InvalidRegion(format!(
                "end line {end_line} precedes start line {start_line}"
            )));
        }
        if end_line == start_line && end_col < start_col {
            return Err(EditDomainError::InvalidRegion(format!(
                "end column {end_col} precedes start column {start_col}"
            )));
        }
        Ok(Self {
            buffer,
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }

    /// Creates a region covering whole lines `start_line..=end_line`.
    ///
    /// # Errors
    ///
    /// Returns [`EditDomainError::InvalidRegion`] under the same rules as
    /// [`Region::new`].
    pub fn whole_lines(
        buffer: BufferId,
        start_line: usize,
        end_line: usize,
    ) -> Result<Self, EditDomainError> {
        Self::new(buffer, (start_line, 1), (end_line, Self::LINE_END))
    }

    /// Returns the buffer the region belongs to.
    #[must_use]
    pub const fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Returns the first line, 1-indexed.
    #[must_use]
    pub const fn start_line(&self) -> usize {
        self.start_line
    }

    /// Returns the first column, 1-indexed.
    #[must_use]
    pub const fn start_col(&self) -> usize {
        self.start_col
    }

    /// Returns the last line, 1-indexed and inclusive.
    #[must_use]
    pub const fn end_line(&self) -> usize {
        self.end_line
    }

    /// Returns the last column, 1-indexed and inclusive.
    #[must_use]
    pub const fn end_col(&self) -> usize {
        self.end_col
    }

    /// Returns the number of lines the region spans.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Returns the 0-indexed, end-exclusive line range covered by the region.
    #[must_use]
    pub const fn line_span(&self) -> (usize, usize) {
        (self.start_line - 1, self.end_line)
    }

    /// Extracts the region text from a buffer's lines.
    ///
    /// Returns `None` when the buffer is shorter than the region.
    #[must_use]
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Option<String> {
        let (start, end) = self.line_span();
        let selected = lines.get(start..end)?;
        let last_index = selected.len().saturating_sub(1);
        let pieces: Vec<String> = selected
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let skip = if index == 0 { self.start_col - 1 } else { 0 };
                let take = if index == last_index {
                    if index == 0 {
                        self.end_col.saturating_sub(self.start_col).saturating_add(1)
                    } else {
                        self.end_col
                    }
                } else {
                    usize::MAX
                };
                line.as_ref().chars().skip(skip).take(take).collect()
            })
            .collect();
        Some(pieces.join("\n"))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer {} lines {}-{}",
            self.buffer, self.start_line, self.end_line
        )
    }
}

/// Exact text of a region at the moment its task was created.
///
/// Snapshots are never mutated; they exist only for conflict comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

impl Snapshot {
    /// Captures region text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the captured text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when `live` is byte-for-byte equal to the snapshot.
    #[must_use]
    pub fn matches(&self, live: &str) -> bool {
        self.0.as_bytes() == live.as_bytes()
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
