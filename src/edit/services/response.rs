//! Normalizes a raw backend response into replacement text.

use crate::backend::domain::BackendResponse;
use crate::edit::domain::{DirectiveSyntax, ErrorInfo, ErrorKind, ParsedResponse};

const FENCE: &str = "```";

/// Extracts the replacement body and optional import directive from a
/// backend response.
///
/// The text of every textual segment is concatenated in order. One leading
/// and one trailing fenced code block delimiter are stripped, then an
/// `<token> IMPORTS: <payload>` directive on the first line is captured and
/// removed. Leading and trailing blank lines are trimmed; everything in
/// between is kept verbatim.
///
/// # Errors
///
/// Returns an [`ErrorKind::NoContent`] record when the response carries no
/// text, and an [`ErrorKind::EmptyBody`] record when nothing remains after
/// cleanup.
///
/// # Examples
///
/// ```
/// use scrivener::backend::domain::BackendResponse;
/// use scrivener::edit::domain::DirectiveSyntax;
/// use scrivener::edit::services::parse_response;
///
/// let response = BackendResponse::text("-- IMPORTS: import bar\nfoo_safe()");
/// let parsed = parse_response(&response, &DirectiveSyntax::default()).unwrap();
/// assert_eq!(parsed.body, "foo_safe()");
/// assert_eq!(parsed.auxiliary.as_deref(), Some("import bar"));
/// ```
pub fn parse_response(
    response: &BackendResponse,
    syntax: &DirectiveSyntax,
) -> Result<ParsedResponse, ErrorInfo> {
    let text = response.text_segments().concat();
    if text.is_empty() {
        return Err(ErrorInfo::new(
            ErrorKind::NoContent,
            "backend response contained no text",
        ));
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    strip_fences(&mut lines);
    let auxiliary = take_directive(&mut lines, syntax);
    if auxiliary.is_some() {
        strip_fences(&mut lines);
    }
    trim_blank_lines(&mut lines);

    let body = lines.join("\n");
    if body.is_empty() {
        return Err(ErrorInfo::new(
            ErrorKind::EmptyBody,
            "backend response has no code after cleanup",
        ));
    }
    Ok(ParsedResponse {
        body,
        auxiliary: auxiliary.filter(|payload| !payload.is_empty()),
    })
}

fn is_blank(line: &&str) -> bool {
    line.trim().is_empty()
}

fn is_opening_fence(line: &str) -> bool {
    line.trim()
        .strip_prefix(FENCE)
        .is_some_and(|tag| !tag.contains('`') && !tag.contains(char::is_whitespace))
}

fn is_closing_fence(line: &str) -> bool {
    line.trim() == FENCE
}

fn strip_fences(lines: &mut Vec<&str>) {
    if let Some(first) = lines.iter().position(|line| !is_blank(line))
        && lines.get(first).is_some_and(|line| is_opening_fence(line))
    {
        lines.drain(..=first);
    }
    if let Some(last) = lines.iter().rposition(|line| !is_blank(line))
        && lines.get(last).is_some_and(|line| is_closing_fence(line))
    {
        lines.truncate(last);
    }
}

fn take_directive(lines: &mut Vec<&str>, syntax: &DirectiveSyntax) -> Option<String> {
    let first = lines.iter().position(|line| !is_blank(line))?;
    let payload = lines
        .get(first)
        .and_then(|line| syntax.match_directive(line))?
        .to_owned();
    lines.drain(..=first);
    Some(payload)
}

fn trim_blank_lines(lines: &mut Vec<&str>) {
    let end = lines
        .iter()
        .rposition(|line| !is_blank(line))
        .map_or(0, |index| index + 1);
    lines.truncate(end);
    let start = lines
        .iter()
        .position(|line| !is_blank(line))
        .unwrap_or(lines.len());
    lines.drain(..start);
}
