//! Runtime configuration for edit orchestration.
//!
//! Configuration is read-only to the core. Hosts build an [`EditConfig`]
//! directly or load one from TOML:
//!
//! ```
//! use scrivener::config::EditConfig;
//!
//! let config = EditConfig::from_toml_str(
//!     r#"
//!     review_mode = true
//!     model = "anthropic/claude-sonnet"
//!
//!     [conflict]
//!     cancel_on_conflict = true
//!     "#,
//! )
//! .unwrap();
//! assert!(config.review_mode);
//! assert!(config.conflict.cancel_on_conflict);
//! assert!(config.conflict.warn_on_conflict);
//! ```

use crate::backend::domain::{ModelSpec, ModelSpecError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default number of leading document lines scanned for import statements.
pub const DEFAULT_IMPORT_SCAN_WINDOW: usize = 50;

/// Errors returned while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The configured model is not in `provider/model` form.
    #[error(transparent)]
    Model(#[from] ModelSpecError),

    /// The import scan window must cover at least one line.
    #[error("import_scan_window must be greater than zero")]
    EmptyScanWindow,

    /// Readiness polling must allow at least one attempt.
    #[error("readiness.max_attempts must be greater than zero")]
    NoReadinessAttempts,
}

/// What to do when the document region changed while a task was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    /// Surface a warning to the UI before applying over a changed region.
    pub warn_on_conflict: bool,
    /// Cancel the task instead of applying over a changed region.
    pub cancel_on_conflict: bool,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            warn_on_conflict: true,
            cancel_on_conflict: false,
        }
    }
}

/// Bounded readiness polling performed before session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessPolicy {
    /// Whether tasks wait for backend readiness before creating a session.
    pub enabled: bool,
    /// Maximum number of readiness checks.
    pub max_attempts: u32,
    /// Delay between readiness checks, in milliseconds.
    pub interval_ms: u64,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 20,
            interval_ms: 250,
        }
    }
}

impl ReadinessPolicy {
    /// Returns the delay between readiness checks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Edit orchestration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Conflict handling policy.
    pub conflict: ConflictPolicy,
    /// Route every result through the review gate before applying it.
    pub review_mode: bool,
    /// Model selection in `provider/model` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Number of leading lines scanned when placing imports.
    pub import_scan_window: usize,
    /// Backend readiness gating.
    pub readiness: ReadinessPolicy,
    /// `minijinja` template overriding the built-in prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            conflict: ConflictPolicy::default(),
            review_mode: false,
            model: None,
            import_scan_window: DEFAULT_IMPORT_SCAN_WINDOW,
            readiness: ReadinessPolicy::default(),
            prompt_template: None,
        }
    }
}

impl EditConfig {
    /// Parses and validates configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document is malformed or a value
    /// fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import_scan_window == 0 {
            return Err(ConfigError::EmptyScanWindow);
        }
        if self.readiness.max_attempts == 0 {
            return Err(ConfigError::NoReadinessAttempts);
        }
        self.model_spec()?;
        Ok(())
    }

    /// Returns the parsed model selection, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSpecError`] when the model string is malformed.
    pub fn model_spec(&self) -> Result<Option<ModelSpec>, ModelSpecError> {
        self.model.as_deref().map(ModelSpec::parse).transpose()
    }
}
