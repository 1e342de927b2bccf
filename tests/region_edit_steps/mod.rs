//! Step definitions for region edit scenarios.

pub mod then;
pub mod when;
