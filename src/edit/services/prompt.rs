//! Backend prompt rendering.

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::edit::domain::{EditTask, LanguageFamily};

/// Built-in prompt sent to the backend for every edit task.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are editing part of a {% if filetype %}{{ filetype }}{% else %}plain text{% endif %} document.
Rewrite the code below according to this instruction: {{ instruction }}

Lines {{ start_line }}-{{ end_line }} currently read:
```{{ filetype }}
{{ original }}
```

Reply with the replacement code only, without explanations or surrounding prose.
If the new code needs imports that are not already present, make the very first line
`{{ directive_token }} IMPORTS: <import statements>` and put nothing else on that line.";

/// Errors returned while rendering a prompt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The template failed to render.
    #[error("prompt template failed to render: {0}")]
    Render(String),
}

/// Values available to the prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptContext<'a> {
    /// The user's edit instruction.
    pub instruction: &'a str,
    /// Region text captured at task creation.
    pub original: &'a str,
    /// Declared filetype of the document, or empty.
    pub filetype: &'a str,
    /// First line of the region, 1-indexed.
    pub start_line: usize,
    /// Last line of the region, 1-indexed.
    pub end_line: usize,
    /// Comment token the backend should put in front of `IMPORTS:`.
    pub directive_token: &'a str,
}

impl<'a> PromptContext<'a> {
    /// Builds the context for `task` in a document of `filetype`.
    #[must_use]
    pub fn for_task(task: &'a EditTask, filetype: Option<&'a str>) -> Self {
        let family = filetype.map_or(LanguageFamily::Unknown, LanguageFamily::from_filetype);
        Self {
            instruction: task.prompt(),
            original: task.snapshot().as_str(),
            filetype: filetype.unwrap_or_default(),
            start_line: task.region().start_line(),
            end_line: task.region().end_line(),
            directive_token: family.directive_token(),
        }
    }
}

/// Renders backend prompts from a `minijinja` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRenderer {
    template: String,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PromptRenderer {
    /// Creates a renderer using `template`, or the built-in template.
    #[must_use]
    pub fn new(template: Option<String>) -> Self {
        Self {
            template: template.unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_owned()),
        }
    }

    /// Returns the template source.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the prompt for `context`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] when the template is malformed or
    /// references a failing expression.
    pub fn render(&self, context: &PromptContext<'_>) -> Result<String, PromptError> {
        let environment = Environment::new();
        environment
            .render_str(&self.template, context)
            .map_err(|error| PromptError::Render(error.to_string()))
    }
}
