//! Adapter implementations for the backend session protocol.

pub mod memory;
