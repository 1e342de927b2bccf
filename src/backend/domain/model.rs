//! Model selection sent alongside prompts.

use super::ModelSpecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider and model pair selected for a prompt.
///
/// # Examples
///
/// ```
/// use scrivener::backend::domain::ModelSpec;
///
/// let spec = ModelSpec::parse("anthropic/claude-sonnet").unwrap();
/// assert_eq!(spec.provider_id(), "anthropic");
/// assert_eq!(spec.model_id(), "claude-sonnet");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    provider_id: String,
    model_id: String,
}

impl ModelSpec {
    /// Parses a single `provider/model` configuration string.
    ///
    /// Only the first `/` separates provider from model, so model
    /// identifiers may themselves contain slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSpecError`] when the separator is missing or either
    /// segment is empty.
    pub fn parse(value: &str) -> Result<Self, ModelSpecError> {
        let trimmed = value.trim();
        let (provider, model) = trimmed
            .split_once('/')
            .ok_or_else(|| ModelSpecError::MissingSeparator(value.to_owned()))?;
        let provider_id = provider.trim();
        let model_id = model.trim();
        if provider_id.is_empty() {
            return Err(ModelSpecError::EmptyProvider(value.to_owned()));
        }
        if model_id.is_empty() {
            return Err(ModelSpecError::EmptyModel(value.to_owned()));
        }
        Ok(Self {
            provider_id: provider_id.to_owned(),
            model_id: model_id.to_owned(),
        })
    }

    /// Returns the provider identifier.
    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}
