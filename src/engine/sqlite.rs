//! SQLite engine implementation.
//!
//! Provides the `SqliteEngine` struct that implements the `Engine` trait
//! on top of a single sqlx SQLite connection. The working database lives in a
//! private scratch directory that is discarded with the engine, so nothing
//! persists unless it is exported.

use crate::engine::{Engine, QueryResult, Row, Value};
use crate::error::{ConsoleError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow};
use sqlx::{Column as SqlxColumn, Connection, Either, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name of the working database inside the scratch directory.
const WORKING_DB: &str = "console.db";

/// SQLite engine owning one connection to its working database.
pub struct SqliteEngine {
    scratch: TempDir,
    conn: Option<SqliteConnection>,
    exports: u64,
}

impl SqliteEngine {
    /// Creates an engine with a fresh, empty database.
    pub async fn new() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("query-console-")
            .tempdir()
            .map_err(|e| ConsoleError::io(format!("Failed to create scratch directory: {e}")))?;

        let mut engine = Self {
            scratch,
            conn: None,
            exports: 0,
        };
        engine.reset().await?;
        Ok(engine)
    }

    fn working_path(&self) -> PathBuf {
        self.scratch.path().join(WORKING_DB)
    }

    /// Closes the current connection, if any.
    async fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await.map_err(engine_error)?;
        }
        Ok(())
    }

    /// Replaces the working database with an empty one.
    async fn reset(&mut self) -> Result<()> {
        self.disconnect().await?;
        remove_database_files(&self.working_path()).await?;
        self.conn = Some(connect(&self.working_path()).await?);
        Ok(())
    }

    /// Replaces the working database with the given file image.
    async fn replace_with(&mut self, buffer: Vec<u8>) -> Result<()> {
        self.disconnect().await?;
        let path = self.working_path();
        remove_database_files(&path).await?;
        tokio::fs::write(&path, buffer)
            .await
            .map_err(|e| ConsoleError::io(format!("Failed to write database image: {e}")))?;

        let mut conn = connect(&path).await?;

        // SQLite only reads the header lazily; touch the schema so a file that
        // is not a database is rejected here rather than on the next query.
        sqlx::query("SELECT count(*) FROM sqlite_master")
            .execute(&mut conn)
            .await
            .map_err(engine_error)?;

        self.conn = Some(conn);
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| ConsoleError::internal("Engine has no open database"))
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    async fn open(&mut self, buffer: Option<Vec<u8>>) -> Result<()> {
        let Some(buffer) = buffer else {
            return self.reset().await;
        };

        debug!("Opening database image of {} bytes", buffer.len());
        match self.replace_with(buffer).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Rejected database image: {}", e);
                self.reset().await?;
                Err(e)
            }
        }
    }

    async fn exec(&mut self, sql: &str) -> Result<Vec<QueryResult>> {
        let conn = self.connection()?;
        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);

        let mut results = Vec::new();
        let mut current: Option<QueryResult> = None;

        while let Some(step) = stream.try_next().await.map_err(engine_error)? {
            match step {
                Either::Right(row) => {
                    current
                        .get_or_insert_with(|| QueryResult::new(column_names(&row), Vec::new()))
                        .values
                        .push(convert_row(&row));
                }
                // End of a statement. Statements without rows produce no result.
                Either::Left(_) => {
                    if let Some(result) = current.take() {
                        results.push(result);
                    }
                }
            }
        }

        if let Some(result) = current.take() {
            results.push(result);
        }

        Ok(results)
    }

    async fn export(&mut self) -> Result<Vec<u8>> {
        let n = self.exports;
        self.exports += 1;
        let target = self.scratch.path().join(format!("export-{n}.db"));
        let target_str = target.to_string_lossy().into_owned();

        let conn = self.connection()?;
        sqlx::query("VACUUM INTO ?")
            .bind(target_str)
            .execute(&mut *conn)
            .await
            .map_err(engine_error)?;

        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| ConsoleError::io(format!("Failed to read exported database: {e}")))?;

        if let Err(e) = tokio::fs::remove_file(&target).await {
            warn!("Failed to remove export scratch file: {}", e);
        }

        Ok(bytes)
    }

    async fn close(&mut self) -> Result<()> {
        self.disconnect().await
    }
}

/// Opens a connection to the database file at `path`, creating it if needed.
async fn connect(path: &Path) -> Result<SqliteConnection> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Delete)
        .create_if_missing(true);

    SqliteConnection::connect_with(&options)
        .await
        .map_err(engine_error)
}

/// Removes a database file and its journal files if present.
async fn remove_database_files(path: &Path) -> Result<()> {
    let companions = ["-journal", "-wal", "-shm"]
        .into_iter()
        .map(|suffix| PathBuf::from(format!("{}{suffix}", path.display())));
    for file in std::iter::once(path.to_path_buf()).chain(companions) {
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConsoleError::io(format!(
                    "Failed to remove {}: {e}",
                    file.display()
                )))
            }
        }
    }
    Ok(())
}

/// Maps an sqlx error to an engine error carrying SQLite's own message.
fn engine_error(e: sqlx::Error) -> ConsoleError {
    match e {
        sqlx::Error::Database(db) => ConsoleError::engine(db.message()),
        other => ConsoleError::engine(other.to_string()),
    }
}

fn column_names(row: &SqliteRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Converts a SQLite row to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Storage class of a single SQLite value.
enum StorageClass {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

fn storage_class(row: &SqliteRow, index: usize) -> StorageClass {
    let Ok(raw) = row.try_get_raw(index) else {
        return StorageClass::Null;
    };
    if raw.is_null() {
        return StorageClass::Null;
    }
    // Values carry their own type in SQLite, independent of the declared
    // column type.
    match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => StorageClass::Integer,
        "REAL" => StorageClass::Real,
        "BLOB" => StorageClass::Blob,
        _ => StorageClass::Text,
    }
}

/// Converts a single column value from a SQLite row.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    match storage_class(row, index) {
        StorageClass::Null => Value::Null,
        StorageClass::Integer => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        StorageClass::Real => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        StorageClass::Blob => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        StorageClass::Text => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
