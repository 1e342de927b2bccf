//! Region edit orchestration for Scrivener.
//!
//! A user marks a region of a live document and submits an instruction. The
//! lifecycle service drives the resulting task through backend session
//! creation, prompting, conflict detection, optional review, and the atomic
//! apply. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
