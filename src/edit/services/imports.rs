//! Placement of auxiliary import lines.

use crate::edit::domain::LanguageFamily;

/// Returns the 0-indexed line before which imports should be inserted.
///
/// `window` is the leading slice of the document that was scanned. The
/// result is the line after the last import statement in the window. With
/// no imports, it is the line after a leading shebang and comment-only
/// preamble, or `0` when there is none.
pub fn find_import_insertion_line<S>(window: &[S], family: LanguageFamily) -> usize
where
    S: AsRef<str>,
{
    if let Some(last_import) = window
        .iter()
        .rposition(|line| family.is_import_line(line.as_ref()))
    {
        return last_import + 1;
    }
    window
        .iter()
        .take_while(|line| {
            let text = line.as_ref();
            LanguageFamily::is_shebang(text) || family.is_comment_line(text)
        })
        .count()
}

/// Returns the lines of `auxiliary` that still need inserting.
///
/// Blank lines are dropped, as are lines already present in `window` once
/// surrounding whitespace is ignored.
pub fn pending_import_lines<S>(auxiliary: &str, window: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    let mut pending: Vec<String> = Vec::new();
    for candidate in auxiliary.lines().map(str::trim_end) {
        let trimmed = candidate.trim();
        let already_present = window.iter().any(|line| line.as_ref().trim() == trimmed)
            || pending.iter().any(|line| line.trim() == trimmed);
        if !trimmed.is_empty() && !already_present {
            pending.push(candidate.to_owned());
        }
    }
    pending
}
