//! Adapter implementations for edit ports.

pub mod memory;
