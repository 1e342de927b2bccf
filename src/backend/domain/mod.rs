//! Domain model for the AI backend session protocol.
//!
//! Session correlation handles, model selection, and the response payload
//! shapes the backend may return. Transport concerns stay outside.

mod error;
mod ids;
mod model;
mod response;

pub use error::ModelSpecError;
pub use ids::SessionId;
pub use model::ModelSpec;
pub use response::{BackendResponse, ResponsePart, StructuredResponse};
