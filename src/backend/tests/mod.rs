//! Unit tests for the backend session protocol.
