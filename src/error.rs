//! Error types for the query console.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for console operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// The engine refused a request (syntax errors, constraint violations,
    /// files that are not databases). Carries the engine's message verbatim.
    #[error("{0}")]
    Engine(String),

    /// The background worker channel failed (task gone, reply dropped).
    #[error("Worker error: {0}")]
    Worker(String),

    /// Configuration errors (invalid config file, bad CLI values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// State database errors (cannot open, migrate, read or write).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// File system errors while loading or saving database files.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal application errors (terminal setup, unexpected states).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Creates an engine error with the given message.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Creates a worker error with the given message.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Engine(_) => "Engine Error",
            Self::Worker(_) => "Worker Error",
            Self::Config(_) => "Configuration Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ConsoleError.
pub type Result<T> = std::result::Result<T, ConsoleError>;
