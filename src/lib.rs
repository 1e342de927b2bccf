//! Scrivener: asynchronous AI edits of live document regions.
//!
//! A user marks a region of a document that may keep changing, issues a
//! natural-language instruction, and an external AI backend produces
//! replacement text for exactly that region. The result is applied
//! atomically, optionally after human review, and only after the region is
//! re-checked against the snapshot taken when the request was made.
//!
//! # Architecture
//!
//! Scrivener follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, channels)
//!
//! # Modules
//!
//! - [`backend`]: AI backend session protocol and readiness gating
//! - [`edit`]: Edit task state machine, registry, and apply pipeline
//! - [`config`]: Runtime configuration

pub mod backend;
pub mod config;
pub mod edit;
