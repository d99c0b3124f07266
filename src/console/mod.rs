//! Query console controller.
//!
//! Relays SQL to the engine worker, routes the reply through the result gate,
//! and keeps the state the front-ends draw: output area, error banner, notices
//! and the editor's query text.
//!
//! Requests are split in two halves so a front-end can keep drawing while the
//! engine works: [`Console::execute`] (and friends) update the state and
//! return a [`PendingRequest`]; the front-end sends it, and hands the
//! [`Completion`] back to [`Console::complete`]. Only the most recent
//! execution is tracked; an older execution's completion is ignored. Loads and
//! saves are never superseded: the worker answers them in order and each
//! answer is applied.

mod gate;
mod render;

pub use gate::{Confirmation, GateOutcome, GateState, ResultGate};
pub use render::{render_results, render_table, Cell, RenderedTable};

use crate::engine::{EngineHandle, EngineReply, EngineRequest, RequestId};
use crate::error::{ConsoleError, Result};
use crate::persistence::StateStore;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Query shown when nothing was stored: lists the tables of the database.
pub const DEFAULT_QUERY: &str = "SELECT `name`, `sql`\n  FROM `sqlite_master`\n  WHERE type='table';";

/// Placeholder text while the engine works.
pub const FETCHING_PLACEHOLDER: &str = "Fetching results...";

/// Settings fixed for the lifetime of a console.
#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    /// Row count above which confirmation is requested.
    pub threshold: usize,
    /// Where saved databases are written.
    pub export_path: PathBuf,
}

/// What the output area shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Output {
    /// Nothing yet, or the last request failed.
    #[default]
    Empty,
    /// A query is running.
    Fetching,
    /// A large result is parked behind the confirmation prompt.
    AwaitingConfirmation { row_count: usize, threshold: usize },
    /// Rendered tables, one per result.
    Tables(Vec<RenderedTable>),
}

/// Kind of request currently tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// SQL execution.
    Execute,
    /// Database replacement from a file; carries the file's label.
    Load { label: String },
    /// Database export to the configured file.
    Save,
}

impl RequestKind {
    /// Status line label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Execute => "Executing",
            Self::Load { .. } => "Loading",
            Self::Save => "Saving",
        }
    }
}

/// A request the front-end still has to send.
#[derive(Debug)]
#[must_use = "a pending request does nothing until it is sent"]
pub struct PendingRequest {
    /// Id the completion must carry.
    pub id: RequestId,
    /// The request for the engine.
    pub request: EngineRequest,
}

impl PendingRequest {
    /// Sends the request and waits for the engine's answer.
    pub async fn send(self, engine: &EngineHandle) -> Completion {
        let reply = engine.send(self.id, self.request).await;
        Completion { id: self.id, reply }
    }
}

/// The engine's answer to a pending request.
#[derive(Debug)]
pub struct Completion {
    /// Id of the request this answers.
    pub id: RequestId,
    /// The reply, or a worker-level failure.
    pub reply: Result<EngineReply>,
}

struct InFlight {
    id: RequestId,
    kind: RequestKind,
    started: Instant,
}

/// The query console controller.
pub struct Console {
    engine: EngineHandle,
    store: Option<StateStore>,
    settings: ConsoleSettings,
    gate: ResultGate,
    output: Output,
    /// Banner error and its rendered text.
    error: Option<(ConsoleError, String)>,
    notice: Option<String>,
    /// The execution whose results the output area waits for.
    running: Option<InFlight>,
    /// Loads and saves in flight, oldest first.
    transfers: Vec<InFlight>,
    query: String,
    database_label: Option<String>,
}

impl Console {
    /// Creates a console and restores the last query from the store.
    pub async fn new(
        engine: EngineHandle,
        store: Option<StateStore>,
        settings: ConsoleSettings,
    ) -> Self {
        let query = match &store {
            Some(store) => match store.last_query().await {
                Ok(Some(query)) => query,
                Ok(None) => DEFAULT_QUERY.to_string(),
                Err(e) => {
                    warn!("Could not restore last query: {}", e);
                    DEFAULT_QUERY.to_string()
                }
            },
            None => DEFAULT_QUERY.to_string(),
        };

        Self {
            engine,
            store,
            gate: ResultGate::new(settings.threshold),
            settings,
            output: Output::Empty,
            error: None,
            notice: None,
            running: None,
            transfers: Vec::new(),
            query,
            database_label: None,
        }
    }

    /// The engine handle requests are sent through.
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Current editor text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the editor text, persisting it when non-empty.
    pub async fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.query {
            return;
        }
        self.query = text;

        if self.query.is_empty() {
            return;
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.set_last_query(&self.query).await {
                warn!("Could not persist query: {}", e);
            }
        }
    }

    /// Current output area.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Error banner text, if shown.
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|(_, text)| text.as_str())
    }

    /// The error behind the banner, with its category.
    pub fn last_error(&self) -> Option<&ConsoleError> {
        self.error.as_ref().map(|(err, _)| err)
    }

    /// Takes the pending one-shot notice (e.g. "saved to ...").
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Label of the loaded database file, `None` for the initial empty one.
    pub fn database_label(&self) -> Option<&str> {
        self.database_label.as_deref()
    }

    /// Display threshold in rows.
    pub fn threshold(&self) -> usize {
        self.gate.threshold()
    }

    /// Kind of the request the spinner reports: the running execution, else
    /// the oldest load or save still in flight.
    pub fn busy(&self) -> Option<&RequestKind> {
        self.running
            .as_ref()
            .or_else(|| self.transfers.first())
            .map(|f| &f.kind)
    }

    /// Whether the confirmation prompt is up.
    pub fn awaiting_confirmation(&self) -> bool {
        self.gate.is_awaiting()
    }

    /// Starts executing `sql`. Supersedes a running execution; loads and saves
    /// in flight are unaffected.
    pub fn execute(&mut self, sql: &str) -> PendingRequest {
        self.error = None;
        self.gate.reset();
        self.output = Output::Fetching;
        self.track(
            RequestKind::Execute,
            EngineRequest::Exec {
                sql: sql.to_string(),
            },
        )
    }

    /// Executes the editor contents with a statement terminator appended.
    pub fn execute_editor(&mut self) -> PendingRequest {
        let sql = format!("{};", self.query);
        self.execute(&sql)
    }

    /// Starts replacing the database with `buffer`.
    pub fn load(&mut self, buffer: Vec<u8>, label: impl Into<String>) -> PendingRequest {
        self.track(
            RequestKind::Load {
                label: label.into(),
            },
            EngineRequest::Open {
                buffer: Some(buffer),
            },
        )
    }

    /// Reads a database file and starts loading it. A read failure goes to the
    /// error banner and nothing is sent.
    pub async fn load_file(&mut self, path: &Path) -> Option<PendingRequest> {
        match tokio::fs::read(path).await {
            Ok(buffer) => {
                let label = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                Some(self.load(buffer, label))
            }
            Err(e) => {
                let err = ConsoleError::io(format!("Cannot read {}: {e}", path.display()));
                self.report(&err);
                None
            }
        }
    }

    /// Starts exporting the database to the configured file.
    pub fn save(&mut self) -> PendingRequest {
        self.track(RequestKind::Save, EngineRequest::Export)
    }

    /// Path saved databases are written to.
    pub fn export_path(&self) -> &Path {
        &self.settings.export_path
    }

    fn track(&mut self, kind: RequestKind, request: EngineRequest) -> PendingRequest {
        let id = RequestId::new();
        let entry = InFlight {
            id,
            kind,
            started: Instant::now(),
        };
        if entry.kind == RequestKind::Execute {
            if let Some(previous) = self.running.replace(entry) {
                debug!("Execution {} superseded by {}", previous.id, id);
            }
        } else {
            self.transfers.push(entry);
        }
        PendingRequest { id, request }
    }

    fn untrack(&mut self, id: RequestId) -> Option<InFlight> {
        if self.running.as_ref().is_some_and(|f| f.id == id) {
            return self.running.take();
        }
        let index = self.transfers.iter().position(|f| f.id == id)?;
        Some(self.transfers.remove(index))
    }

    /// Applies the engine's answer. Returns a follow-up request when the
    /// answer calls for one (a loaded database re-runs the editor query).
    pub async fn complete(&mut self, completion: Completion) -> Option<PendingRequest> {
        let Some(in_flight) = self.untrack(completion.id) else {
            debug!("Ignoring stale completion {}", completion.id);
            return None;
        };

        let elapsed = in_flight.started.elapsed();
        let reply = match completion.reply {
            Ok(reply) => reply,
            Err(e) => {
                error!("{}: {}", e.category(), e);
                self.fail(e, &in_flight.kind);
                return None;
            }
        };

        match (in_flight.kind, reply) {
            (kind, EngineReply::Error(message)) => {
                self.fail(ConsoleError::engine(message), &kind);
                None
            }
            (RequestKind::Execute, EngineReply::Results(results)) => {
                info!("Executing SQL: {}ms", elapsed.as_millis());
                self.show_results(results);
                None
            }
            (RequestKind::Load { label }, EngineReply::Ack) => {
                info!("Loading database from file: {}ms", elapsed.as_millis());
                self.database_label = Some(label);
                self.error = None;
                self.query = self.restored_query().await;
                Some(self.execute_editor())
            }
            (RequestKind::Save, EngineReply::Buffer(bytes)) => {
                info!("Exporting the database: {}ms", elapsed.as_millis());
                self.write_export(bytes).await;
                None
            }
            (kind, reply) => {
                let err = ConsoleError::internal(format!(
                    "unexpected reply to {}: {:?}",
                    kind.label(),
                    reply
                ));
                self.fail(err, &kind);
                None
            }
        }
    }

    /// Query re-run after a load: the stored last query, else the editor text
    /// when there is no store, else the default schema query.
    async fn restored_query(&self) -> String {
        let stored = match &self.store {
            Some(store) => store.last_query().await.unwrap_or_else(|e| {
                warn!("Could not restore last query: {}", e);
                None
            }),
            None => Some(self.query.clone()).filter(|q| !q.trim().is_empty()),
        };
        stored.unwrap_or_else(|| DEFAULT_QUERY.to_string())
    }

    /// Sends `pending` and applies its completion, following up until the
    /// engine has nothing more to do.
    pub async fn run(&mut self, pending: PendingRequest) {
        let mut next = Some(pending);
        while let Some(pending) = next {
            let engine = self.engine.clone();
            let completion = pending.send(&engine).await;
            next = self.complete(completion).await;
        }
    }

    /// Answers the confirmation prompt. Returns false when nothing was pending.
    pub fn confirm(&mut self, choice: Confirmation) -> bool {
        let start = Instant::now();
        match self.gate.resolve(choice) {
            Some(tables) => {
                self.output = Output::Tables(tables);
                info!("Displaying results: {}ms", start.elapsed().as_millis());
                true
            }
            None => false,
        }
    }

    /// Shows an error that did not come from a request (e.g. a file that could
    /// not be read).
    pub fn report(&mut self, err: &ConsoleError) {
        warn!("{}: {}", err.category(), err);
        self.error = Some((err.clone(), err.to_string()));
    }

    fn show_results(&mut self, results: Vec<crate::engine::QueryResult>) {
        let start = Instant::now();
        match self.gate.admit(results) {
            GateOutcome::Render(tables) => {
                self.output = Output::Tables(tables);
                info!("Displaying results: {}ms", start.elapsed().as_millis());
            }
            GateOutcome::Confirm {
                row_count,
                threshold,
            } => {
                debug!("{} rows exceed threshold {}", row_count, threshold);
                self.output = Output::AwaitingConfirmation {
                    row_count,
                    threshold,
                };
            }
        }
    }

    fn fail(&mut self, err: ConsoleError, kind: &RequestKind) {
        let text = err.to_string();
        self.error = Some((err, text));
        match kind {
            RequestKind::Execute => self.output = Output::Empty,
            // The engine is back on an empty database after a refused file.
            RequestKind::Load { .. } => self.database_label = None,
            RequestKind::Save => {}
        }
    }

    async fn write_export(&mut self, bytes: Vec<u8>) {
        let path = self.settings.export_path.clone();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                let err = ConsoleError::io(format!("Cannot create {}: {e}", parent.display()));
                self.report(&err);
                return;
            }
        }

        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => {
                self.notice = Some(format!(
                    "Saved {} bytes to {}",
                    bytes.len(),
                    path.display()
                ));
            }
            Err(e) => {
                let err = ConsoleError::io(format!("Cannot write {}: {e}", path.display()));
                self.report(&err);
            }
        }
    }
}
