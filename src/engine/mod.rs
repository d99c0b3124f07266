//! Database engine layer for the query console.
//!
//! The engine owns the database and runs behind a background worker. The
//! console only ever talks to it through an [`EngineHandle`], one request and
//! one reply at a time.

mod sqlite;
mod types;
mod worker;

pub use sqlite::SqliteEngine;
pub use types::{EngineReply, EngineRequest, QueryResult, Row, Value};
pub use worker::{spawn_worker, EngineHandle, RequestId};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface of a database engine.
///
/// Errors returned as `ConsoleError::Engine` carry the engine's own message
/// and are relayed to the console verbatim.
#[async_trait]
pub trait Engine: Send {
    /// Replaces the current database with an empty one, or with the database
    /// file image in `buffer`.
    async fn open(&mut self, buffer: Option<Vec<u8>>) -> Result<()>;

    /// Executes one or more SQL statements, returning one result per
    /// statement that produced rows.
    async fn exec(&mut self, sql: &str) -> Result<Vec<QueryResult>>;

    /// Serializes the current database to a file image.
    async fn export(&mut self) -> Result<Vec<u8>>;

    /// Releases the database.
    async fn close(&mut self) -> Result<()>;
}
