//! Backend connection services.

mod readiness;

pub use readiness::wait_until_ready;
