//! Library-level integration tests.

pub mod console_test;
pub mod persistence_test;
pub mod worker_test;
