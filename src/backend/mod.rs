//! AI backend session protocol for Scrivener.
//!
//! The backend is an external service that accepts sessions and prompts and
//! returns generated text. This module owns the contract the edit core
//! consumes from it. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Readiness gating in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
