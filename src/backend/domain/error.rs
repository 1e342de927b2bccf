//! Error types for backend domain parsing.

use thiserror::Error;

/// Errors returned while parsing a `provider/model` specification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelSpecError {
    /// The value has no `/` separating provider and model.
    #[error("model '{0}' must use the form provider/model")]
    MissingSeparator(String),

    /// The provider segment is empty after trimming.
    #[error("model '{0}' has an empty provider")]
    EmptyProvider(String),

    /// The model segment is empty after trimming.
    #[error("model '{0}' has an empty model identifier")]
    EmptyModel(String),
}
