//! Headless mode: run once without the terminal UI.
//!
//! Optionally loads a database, executes SQL, answers the large-result prompt
//! from a flag, prints the rendered tables and optionally saves the database.

use crate::cli::{Cli, OutputFormat};
use crate::console::{Confirmation, Console, Output, RenderedTable};
use crate::error::{ConsoleError, Result};
use crate::tui::widgets::results::render_plain;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Configuration for a headless run.
#[derive(Debug, Clone, Default)]
pub struct HeadlessOptions {
    /// SQL to execute instead of the stored query.
    pub sql: Option<String>,
    /// Answer the large-result prompt with "show all".
    pub show_all: bool,
    pub format: OutputFormat,
    /// Export the database after executing.
    pub save: bool,
}

impl HeadlessOptions {
    /// Creates options from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            sql: cli.exec.clone(),
            show_all: cli.show_all,
            format: cli.parse_output_format().map_err(ConsoleError::config)?,
            save: cli.save.is_some(),
        })
    }
}

/// How the large-result prompt was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationReport {
    pub row_count: usize,
    pub threshold: usize,
    pub show_all: bool,
}

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadlessReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub tables: Vec<RenderedTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationReport>,
    /// Notice from a save, e.g. "Saved 8192 bytes to ./sql.db".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<String>,
}

/// Fails with the banner's error when the last request reported one.
fn check(console: &Console) -> Result<()> {
    match console.last_error() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

/// Runs the headless sequence. A successfully loaded `database` already runs
/// the stored query, so it is only executed again when `sql` is given.
pub async fn run(
    console: &mut Console,
    database: Option<&Path>,
    options: &HeadlessOptions,
) -> Result<HeadlessReport> {
    let loaded = database.is_some();
    if let Some(path) = database {
        let pending = console.load_file(path).await;
        check(console)?;
        if let Some(pending) = pending {
            console.run(pending).await;
            check(console)?;
        }
    }

    match &options.sql {
        Some(sql) => {
            let pending = console.execute(sql);
            console.run(pending).await;
        }
        None if !loaded => {
            let pending = console.execute_editor();
            console.run(pending).await;
        }
        None => {}
    }
    check(console)?;

    let mut confirmation = None;
    if let Output::AwaitingConfirmation {
        row_count,
        threshold,
    } = console.output()
    {
        confirmation = Some(ConfirmationReport {
            row_count: *row_count,
            threshold: *threshold,
            show_all: options.show_all,
        });
        let choice = if options.show_all {
            Confirmation::ShowAll
        } else {
            Confirmation::ShowPartial
        };
        info!("{} rows exceed the threshold, answering {:?}", row_count, choice);
        console.confirm(choice);
    }

    let tables = match console.output() {
        Output::Tables(tables) => tables.clone(),
        _ => Vec::new(),
    };

    let mut saved = None;
    if options.save {
        let pending = console.save();
        console.run(pending).await;
        check(console)?;
        saved = console.take_notice();
    }

    Ok(HeadlessReport {
        database: console.database_label().map(str::to_string),
        tables,
        confirmation,
        saved,
    })
}

/// Writes the report in the requested format.
pub fn write_report(
    report: &HeadlessReport,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let io_err = |e: std::io::Error| ConsoleError::io(format!("Failed to write output: {e}"));

    match format {
        OutputFormat::Text => {
            for (i, table) in report.tables.iter().enumerate() {
                if i > 0 {
                    writeln!(out).map_err(io_err)?;
                }
                writeln!(out, "{}", render_plain(table, usize::MAX)).map_err(io_err)?;
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| ConsoleError::internal(format!("Failed to serialize output: {e}")))?;
            writeln!(out, "{json}").map_err(io_err)?;
        }
    }
    Ok(())
}
