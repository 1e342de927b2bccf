//! In-memory document store for deterministic orchestration flows.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::edit::{
    domain::{BufferId, Region},
    ports::{DocumentError, DocumentPort, DocumentResult},
};

/// Line-based in-memory document store.
///
/// Replacements are staged on a copy of the buffer and committed in one
/// step, after the conditional form has compared the region under the same
/// lock. [`InMemoryDocumentStore::fail_replace_after`] injects a fault part
/// way through the staged write to exercise that guarantee.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<DocumentState>>,
}

#[derive(Debug, Default)]
struct DocumentState {
    buffers: HashMap<BufferId, Buffer>,
    next_buffer: u64,
    replace_fault: Option<usize>,
    insert_failure: Option<String>,
}

#[derive(Debug, Clone)]
struct Buffer {
    lines: Vec<String>,
    filetype: Option<String>,
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_owned).collect()
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DocumentResult<RwLockReadGuard<'_, DocumentState>> {
        self.state
            .read()
            .map_err(|err| DocumentError::Rejected(err.to_string()))
    }

    fn write(&self) -> DocumentResult<RwLockWriteGuard<'_, DocumentState>> {
        self.state
            .write()
            .map_err(|err| DocumentError::Rejected(err.to_string()))
    }

    /// Opens a buffer holding `text` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Rejected`] when lock acquisition fails.
    pub fn open_buffer(&self, filetype: Option<&str>, text: &str) -> DocumentResult<BufferId> {
        let mut state = self.write()?;
        state.next_buffer = state.next_buffer.saturating_add(1);
        let buffer = BufferId::new(state.next_buffer);
        state.buffers.insert(
            buffer,
            Buffer {
                lines: split_lines(text),
                filetype: filetype.map(str::to_owned),
            },
        );
        Ok(buffer)
    }

    /// Closes a buffer. Returns `false` when it was not open.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Rejected`] when lock acquisition fails.
    pub fn close_buffer(&self, buffer: BufferId) -> DocumentResult<bool> {
        Ok(self.write()?.buffers.remove(&buffer).is_some())
    }

    /// Replaces the whole buffer text, as a user edit would.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers.
    pub fn set_text(&self, buffer: BufferId, text: &str) -> DocumentResult<()> {
        let mut state = self.write()?;
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        target.lines = split_lines(text);
        Ok(())
    }

    /// Overwrites one 0-indexed line, as a user edit would.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for unknown buffers or lines.
    pub fn set_line(&self, buffer: BufferId, line: usize, text: &str) -> DocumentResult<()> {
        let mut state = self.write()?;
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        let line_count = target.lines.len();
        let slot = target
            .lines
            .get_mut(line)
            .ok_or(DocumentError::LineOutOfRange {
                buffer,
                line,
                line_count,
            })?;
        text.clone_into(slot);
        Ok(())
    }

    /// Returns the full buffer text joined with `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::BufferNotFound`] for unknown buffers.
    pub fn text(&self, buffer: BufferId) -> DocumentResult<String> {
        let state = self.read()?;
        let target = state
            .buffers
            .get(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        Ok(target.lines.join("\n"))
    }

    /// Makes the next replacement fail after staging `written` lines.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Rejected`] when lock acquisition fails.
    pub fn fail_replace_after(&self, written: usize) -> DocumentResult<()> {
        self.write()?.replace_fault = Some(written);
        Ok(())
    }

    /// Makes every subsequent insertion fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Rejected`] when lock acquisition fails.
    pub fn fail_inserts(&self, message: impl Into<String>) -> DocumentResult<()> {
        self.write()?.insert_failure = Some(message.into());
        Ok(())
    }
}

fn check_line(buffer: BufferId, line: usize, line_count: usize) -> DocumentResult<()> {
    if line > line_count {
        return Err(DocumentError::LineOutOfRange {
            buffer,
            line,
            line_count,
        });
    }
    Ok(())
}

/// Writes `lines` over `span` on a copy and commits only if every line lands.
fn stage_replace(
    buffer: BufferId,
    target: &mut Buffer,
    (start, end_exclusive): (usize, usize),
    lines: Vec<String>,
    fault: Option<usize>,
) -> DocumentResult<()> {
    check_line(buffer, end_exclusive, target.lines.len())?;
    check_line(buffer, start, end_exclusive)?;

    let mut staged = target.lines.clone();
    staged.drain(start..end_exclusive);
    for (written, line) in lines.into_iter().enumerate() {
        if fault == Some(written) {
            return Err(DocumentError::Rejected(format!(
                "simulated fault after {written} lines"
            )));
        }
        staged.insert(start + written, line);
    }
    target.lines = staged;
    Ok(())
}

impl DocumentPort for InMemoryDocumentStore {
    fn buffer_exists(&self, buffer: BufferId) -> bool {
        self.read()
            .is_ok_and(|state| state.buffers.contains_key(&buffer))
    }

    fn line_count(&self, buffer: BufferId) -> DocumentResult<usize> {
        let state = self.read()?;
        state
            .buffers
            .get(&buffer)
            .map(|target| target.lines.len())
            .ok_or(DocumentError::BufferNotFound(buffer))
    }

    fn filetype(&self, buffer: BufferId) -> DocumentResult<Option<String>> {
        let state = self.read()?;
        state
            .buffers
            .get(&buffer)
            .map(|target| target.filetype.clone())
            .ok_or(DocumentError::BufferNotFound(buffer))
    }

    fn region_text(&self, region: &Region) -> DocumentResult<String> {
        let buffer = region.buffer();
        let state = self.read()?;
        let target = state
            .buffers
            .get(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        region
            .extract(&target.lines)
            .ok_or(DocumentError::LineOutOfRange {
                buffer,
                line: region.end_line() - 1,
                line_count: target.lines.len(),
            })
    }

    fn lines(&self, buffer: BufferId, start: usize, end: usize) -> DocumentResult<Vec<String>> {
        let state = self.read()?;
        let target = state
            .buffers
            .get(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        Ok(target
            .lines
            .iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .cloned()
            .collect())
    }

    fn replace_lines(
        &self,
        buffer: BufferId,
        start: usize,
        end_exclusive: usize,
        lines: Vec<String>,
    ) -> DocumentResult<()> {
        let mut state = self.write()?;
        let fault = state.replace_fault.take();
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        stage_replace(buffer, target, (start, end_exclusive), lines, fault)
    }

    fn replace_region_if(
        &self,
        region: &Region,
        expected: &str,
        lines: Vec<String>,
    ) -> DocumentResult<()> {
        let buffer = region.buffer();
        let mut state = self.write()?;
        let live = state
            .buffers
            .get(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        if region.extract(&live.lines).as_deref() != Some(expected) {
            return Err(DocumentError::RegionChanged(buffer));
        }
        let fault = state.replace_fault.take();
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        stage_replace(buffer, target, region.line_span(), lines, fault)
    }

    fn insert_lines(&self, buffer: BufferId, at: usize, lines: Vec<String>) -> DocumentResult<()> {
        let mut state = self.write()?;
        if let Some(message) = &state.insert_failure {
            return Err(DocumentError::Rejected(message.clone()));
        }
        let target = state
            .buffers
            .get_mut(&buffer)
            .ok_or(DocumentError::BufferNotFound(buffer))?;
        check_line(buffer, at, target.lines.len())?;
        target.lines.splice(at..at, lines);
        Ok(())
    }
}
