//! query-console - a terminal query console for embedded SQLite databases.
//!
//! This library exposes the core modules for use by the binary and by
//! integration tests.

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod headless;
pub mod logging;
pub mod persistence;
pub mod tui;
