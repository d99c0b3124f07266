//! Table renderer: turns a query result into display cells.
//!
//! Values become plain text; nothing in a value or column name is interpreted
//! as markup. The only decisions made here are the row cap and keeping column
//! and row order intact.

use crate::engine::{QueryResult, Row, Value};
use serde::Serialize;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Text shown in the cell.
    pub text: String,
    /// Whether the value was SQL NULL.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub null: bool,
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        Self {
            text: value.to_display_string(),
            null: value.is_null(),
        }
    }
}

/// A result ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTable {
    /// Column names in engine order.
    pub header: Vec<String>,
    /// Rendered rows, at most the cap that was requested.
    pub body: Vec<Vec<Cell>>,
    /// Row count of the result the table was rendered from.
    pub total_rows: usize,
}

impl RenderedTable {
    /// Number of rendered rows.
    pub fn shown_rows(&self) -> usize {
        self.body.len()
    }

    /// Whether rows were left out because of the cap.
    pub fn is_truncated(&self) -> bool {
        self.body.len() < self.total_rows
    }
}

/// Renders at most `cap` rows of a result.
pub fn render_table(columns: Vec<String>, rows: Vec<Row>, cap: usize) -> RenderedTable {
    let total_rows = rows.len();
    let body = rows
        .iter()
        .take(cap)
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    RenderedTable {
        header: columns,
        body,
        total_rows,
    }
}

/// Renders every result in order with the same per-result cap.
pub fn render_results(results: Vec<QueryResult>, cap: usize) -> Vec<RenderedTable> {
    results
        .into_iter()
        .map(|result| render_table(result.columns, result.values, cap))
        .collect()
}
