//! Parsed backend proposals and the directive syntax embedded in them.

use serde::{Deserialize, Serialize};

/// Keyword that follows the comment token on a directive line.
const IMPORTS_KEYWORD: &str = "IMPORTS:";

/// Replacement text extracted from a backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Replacement for the task's region.
    pub body: String,
    /// Auxiliary content to insert elsewhere, such as import statements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<String>,
}

impl ParsedResponse {
    /// Returns the body split into document lines on `\n`.
    #[must_use]
    pub fn body_lines(&self) -> Vec<String> {
        self.body.split('\n').map(str::to_owned).collect()
    }
}

/// Line-comment tokens recognized in front of an `IMPORTS:` directive.
///
/// A directive line reads `<token> IMPORTS: <payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveSyntax {
    comment_tokens: Vec<String>,
}

impl Default for DirectiveSyntax {
    fn default() -> Self {
        Self::new(["--", "//", "#"])
    }
}

impl DirectiveSyntax {
    /// Creates a syntax recognizing the given comment tokens.
    ///
    /// Longer tokens are tried first.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut comment_tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .filter(|token: &String| !token.is_empty())
            .collect();
        comment_tokens.sort_by(|left, right| {
            right
                .len()
                .cmp(&left.len())
                .then_with(|| left.cmp(right))
        });
        comment_tokens.dedup();
        Self { comment_tokens }
    }

    /// Returns a copy extended with additional comment tokens.
    #[must_use]
    pub fn with_tokens<'a>(&self, extra: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            self.comment_tokens
                .iter()
                .cloned()
                .chain(extra.into_iter().map(str::to_owned))
                .collect::<Vec<_>>(),
        )
    }

    /// Returns the recognized comment tokens, longest first.
    #[must_use]
    pub fn comment_tokens(&self) -> &[String] {
        &self.comment_tokens
    }

    /// Returns the directive payload when `line` is a directive line.
    ///
    /// The payload is trimmed; an empty payload still counts as a
    /// directive.
    #[must_use]
    pub fn match_directive<'l>(&self, line: &'l str) -> Option<&'l str> {
        let trimmed = line.trim_start();
        self.comment_tokens.iter().find_map(|token| {
            trimmed
                .strip_prefix(token.as_str())
                .map(str::trim_start)
                .and_then(|rest| rest.strip_prefix(IMPORTS_KEYWORD))
                .map(str::trim)
        })
    }

    /// Formats a directive line for `payload` using `token`.
    #[must_use]
    pub fn render(token: &str, payload: &str) -> String {
        format!("{token} {IMPORTS_KEYWORD} {payload}")
    }
}
