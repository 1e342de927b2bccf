//! Per-language import and comment conventions.
//!
//! The apply engine places auxiliary import lines using these patterns. The
//! language is derived from the document's declared filetype.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Language family sharing import and comment syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageFamily {
    /// Lua.
    Lua,
    /// Python.
    Python,
    /// JavaScript, TypeScript, and their JSX variants.
    JavaScript,
    /// Rust.
    Rust,
    /// Go.
    Go,
    /// C, C++, Objective-C, and CUDA.
    C,
    /// Java, Kotlin, Scala, and Groovy.
    Jvm,
    /// Ruby.
    Ruby,
    /// POSIX shells and fish.
    Shell,
    /// Haskell.
    Haskell,
    /// Elixir.
    Elixir,
    /// Any other filetype.
    Unknown,
}

static IMPORT_PATTERNS: LazyLock<HashMap<LanguageFamily, RegexSet>> = LazyLock::new(|| {
    LanguageFamily::ALL
        .iter()
        .filter_map(|family| {
            RegexSet::new(family.import_pattern_sources())
                .ok()
                .map(|set| (*family, set))
        })
        .collect()
});

impl LanguageFamily {
    /// Every family.
    pub const ALL: [Self; 12] = [
        Self::Lua,
        Self::Python,
        Self::JavaScript,
        Self::Rust,
        Self::Go,
        Self::C,
        Self::Jvm,
        Self::Ruby,
        Self::Shell,
        Self::Haskell,
        Self::Elixir,
        Self::Unknown,
    ];

    /// Maps an editor filetype to its family.
    #[must_use]
    pub fn from_filetype(filetype: &str) -> Self {
        match filetype.trim().to_ascii_lowercase().as_str() {
            "lua" | "luau" => Self::Lua,
            "python" | "py" => Self::Python,
            "javascript" | "javascriptreact" | "typescript" | "typescriptreact" | "js" | "jsx"
            | "ts" | "tsx" | "vue" | "svelte" => Self::JavaScript,
            "rust" | "rs" => Self::Rust,
            "go" => Self::Go,
            "c" | "cpp" | "objc" | "objcpp" | "cuda" | "h" | "hpp" => Self::C,
            "java" | "kotlin" | "scala" | "groovy" => Self::Jvm,
            "ruby" | "rb" => Self::Ruby,
            "sh" | "bash" | "zsh" | "fish" => Self::Shell,
            "haskell" | "hs" => Self::Haskell,
            "elixir" | "ex" | "exs" => Self::Elixir,
            _ => Self::Unknown,
        }
    }

    /// Returns the line-comment tokens of the family.
    #[must_use]
    pub const fn comment_tokens(self) -> &'static [&'static str] {
        match self {
            Self::Lua | Self::Haskell => &["--"],
            Self::Python | Self::Ruby | Self::Shell | Self::Elixir => &["#"],
            Self::JavaScript | Self::Rust | Self::Go | Self::C | Self::Jvm => &["//"],
            Self::Unknown => &["--", "//", "#"],
        }
    }

    /// Returns the comment token the backend is asked to use for directives.
    #[must_use]
    pub const fn directive_token(self) -> &'static str {
        match self {
            Self::Lua | Self::Haskell | Self::Unknown => "--",
            Self::Python | Self::Ruby | Self::Shell | Self::Elixir => "#",
            Self::JavaScript | Self::Rust | Self::Go | Self::C | Self::Jvm => "//",
        }
    }

    const fn block_comment_markers(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript | Self::Rust | Self::Go | Self::C | Self::Jvm => &["/*", "*"],
            Self::Lua => &["--[["],
            Self::Haskell => &["{-"],
            Self::Python | Self::Ruby | Self::Shell | Self::Elixir | Self::Unknown => &[],
        }
    }

    const fn import_pattern_sources(self) -> &'static [&'static str] {
        match self {
            Self::Lua => &[
                r"^\s*local\s+[\w.]+\s*=\s*require\b",
                r#"^\s*require\s*[\(\"']"#,
            ],
            Self::Python => &[r"^\s*import\s+\w", r"^\s*from\s+[\w.]+\s+import\s"],
            Self::JavaScript => &[
                r"^\s*import\b",
                r"^\s*(const|let|var)\s+.+=\s*require\(",
            ],
            Self::Rust => &[r"^\s*(pub(\([^)]*\))?\s+)?use\s", r"^\s*extern\s+crate\s"],
            Self::Go => &[r"^\s*import\b"],
            Self::C => &[r"^\s*#\s*(include|import)\b"],
            Self::Jvm => &[r"^\s*import\s", r"^\s*package\s"],
            Self::Ruby => &[r"^\s*require(_relative)?\b"],
            Self::Shell => &[r"^\s*(source|\.)\s+\S"],
            Self::Haskell => &[r"^\s*import\s"],
            Self::Elixir => &[r"^\s*(import|alias|require|use)\s"],
            Self::Unknown => &[
                r"^\s*(import|from|require|use)\b",
                r"^\s*#\s*include\b",
            ],
        }
    }

    /// Returns `true` when `line` is an import or include statement.
    #[must_use]
    pub fn is_import_line(self, line: &str) -> bool {
        IMPORT_PATTERNS
            .get(&self)
            .is_some_and(|set| set.is_match(line))
    }

    /// Returns `true` when `line` is a comment and nothing else.
    #[must_use]
    pub fn is_comment_line(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        !trimmed.is_empty()
            && self
                .comment_tokens()
                .iter()
                .chain(self.block_comment_markers())
                .any(|token| trimmed.starts_with(token))
    }

    /// Returns `true` when `line` is a shebang.
    #[must_use]
    pub fn is_shebang(line: &str) -> bool {
        line.starts_with("#!")
    }
}
