//! Query result types and the engine request/reply contract.
//!
//! Defines the structures exchanged with the background engine worker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of one statement that produced rows.
///
/// Column names and rows keep the order the engine returned them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// Column names.
    pub columns: Vec<String>,

    /// Rows of data.
    pub values: Vec<Row>,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn new(columns: Vec<String>, values: Vec<Row>) -> Self {
        Self { columns, values }
    }

    /// Number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value returned by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Signed integer.
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to the text inserted into a table cell.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// A request to the engine worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum EngineRequest {
    /// Replace the current database: empty when `buffer` is `None`,
    /// otherwise the database file contained in `buffer`.
    Open { buffer: Option<Vec<u8>> },
    /// Execute one or more SQL statements.
    Exec { sql: String },
    /// Serialize the current database to a file image.
    Export,
}

impl EngineRequest {
    /// Short label used in logs and status lines.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Exec { .. } => "exec",
            Self::Export => "export",
        }
    }
}

/// The engine's single reply to a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EngineReply {
    /// The database was opened.
    Ack,
    /// Results of an `Exec`, one per statement that produced rows.
    Results(Vec<QueryResult>),
    /// Raw database bytes from an `Export`.
    Buffer(Vec<u8>),
    /// The engine refused the request; the message is the engine's own.
    Error(String),
}
