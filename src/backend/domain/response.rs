//! Response payload shapes returned by the backend.
//!
//! The backend answers a prompt either with a bare string or with a
//! structured object carrying a sequence of parts. Only parts tagged as text
//! carry content the edit core reads; all other parts are ignored.

use serde::{Deserialize, Serialize};

/// Tag value marking a part as textual content.
const TEXT_PART_TYPE: &str = "text";

/// Raw backend response, normalized at the boundary into one of three
/// shapes.
///
/// # Serialisation
///
/// The enum is untagged so that `null`, a JSON string, and a JSON object are
/// all accepted:
///
/// ```json
/// null
/// "plain text answer"
/// { "parts": [{ "type": "text", "text": "..." }, { "type": "step-finish" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendResponse {
    /// The backend returned nothing.
    Empty,
    /// Degenerate case: a bare string.
    Text(String),
    /// A structured object exposing response parts.
    Structured(StructuredResponse),
}

impl BackendResponse {
    /// Creates a bare-string response.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a structured response from parts.
    #[must_use]
    pub fn structured(parts: impl IntoIterator<Item = ResponsePart>) -> Self {
        Self::Structured(StructuredResponse {
            parts: parts.into_iter().collect(),
        })
    }

    /// Deserializes a response from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload matches none of the
    /// accepted shapes.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Returns the text payloads of every textual segment, in order.
    ///
    /// A bare string counts as a single textual segment. An empty response
    /// yields no segments.
    #[must_use]
    pub fn text_segments(&self) -> Vec<&str> {
        match self {
            Self::Empty => Vec::new(),
            Self::Text(text) => vec![text.as_str()],
            Self::Structured(structured) => structured
                .parts
                .iter()
                .filter_map(ResponsePart::text_payload)
                .collect(),
        }
    }
}

/// Structured backend payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// Ordered response parts.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A single segment of a structured response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePart {
    /// Segment type tag, such as `text` or `tool`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Text value associated with the segment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ResponsePart {
    /// Creates a textual segment.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: Some(TEXT_PART_TYPE.to_owned()),
            text: Some(value.into()),
        }
    }

    /// Creates a non-textual segment of the given type.
    #[must_use]
    pub fn other(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            text: None,
        }
    }

    /// Returns `true` when the segment is tagged as textual content.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind.as_deref() == Some(TEXT_PART_TYPE)
    }

    fn text_payload(&self) -> Option<&str> {
        if self.is_text() {
            self.text.as_deref()
        } else {
            None
        }
    }
}
