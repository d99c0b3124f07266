//! Binary tests for headless mode.

mod common;
mod headless_test;
