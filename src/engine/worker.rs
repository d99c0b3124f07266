//! Background worker that owns the engine.
//!
//! Requests travel over an mpsc channel and are processed strictly in arrival
//! order; each carries a oneshot sender for its single reply. Callers never
//! share a reply slot, so overlapping requests queue up instead of replacing
//! each other's handlers.

use super::{Engine, EngineReply, EngineRequest, QueryResult};
use crate::error::{ConsoleError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maximum number of requests waiting for the worker.
const CHANNEL_CAPACITY: usize = 32;

/// Unique identifier for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Generates a new unique request ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the inner u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request in flight to the worker.
struct Envelope {
    id: RequestId,
    request: EngineRequest,
    reply: oneshot::Sender<EngineReply>,
}

/// Cloneable handle for talking to the engine worker.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Envelope>,
    shutdown: CancellationToken,
}

/// Spawns the worker task that owns `engine`.
pub fn spawn_worker(engine: Box<dyn Engine>) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(run(engine, rx, shutdown.clone()));
    (EngineHandle { tx, shutdown }, task)
}

impl EngineHandle {
    /// Sends a request and waits for its reply.
    ///
    /// Engine refusals come back as `Ok(EngineReply::Error(..))`; `Err` means
    /// the worker itself is unreachable.
    pub async fn send(&self, id: RequestId, request: EngineRequest) -> Result<EngineReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            id,
            request,
            reply: reply_tx,
        };

        self.tx
            .send(envelope)
            .await
            .map_err(|_| ConsoleError::worker("engine worker has shut down"))?;

        reply_rx
            .await
            .map_err(|_| ConsoleError::worker(format!("engine worker dropped request {id}")))
    }

    /// Sends a request under a fresh id.
    pub async fn request(&self, request: EngineRequest) -> Result<EngineReply> {
        self.send(RequestId::new(), request).await
    }

    /// Replaces the database, empty when `buffer` is `None`.
    pub async fn open(&self, buffer: Option<Vec<u8>>) -> Result<()> {
        match self.request(EngineRequest::Open { buffer }).await? {
            EngineReply::Ack => Ok(()),
            other => Err(unexpected_reply("open", other)),
        }
    }

    /// Executes SQL and returns its results.
    pub async fn exec(&self, sql: impl Into<String>) -> Result<Vec<QueryResult>> {
        match self.request(EngineRequest::Exec { sql: sql.into() }).await? {
            EngineReply::Results(results) => Ok(results),
            other => Err(unexpected_reply("exec", other)),
        }
    }

    /// Exports the database as a file image.
    pub async fn export(&self) -> Result<Vec<u8>> {
        match self.request(EngineRequest::Export).await? {
            EngineReply::Buffer(bytes) => Ok(bytes),
            other => Err(unexpected_reply("export", other)),
        }
    }

    /// Asks the worker to stop after the request it is currently processing.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Returns true once the worker has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

fn unexpected_reply(action: &str, reply: EngineReply) -> ConsoleError {
    match reply {
        EngineReply::Error(message) => ConsoleError::engine(message),
        other => ConsoleError::internal(format!("unexpected reply to {action}: {other:?}")),
    }
}

/// Worker loop: one request at a time until shutdown or all handles drop.
async fn run(
    mut engine: Box<dyn Engine>,
    mut rx: mpsc::Receiver<Envelope>,
    shutdown: CancellationToken,
) {
    debug!("Engine worker started");

    loop {
        let envelope = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            envelope = rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let action = envelope.request.action();
        let start = Instant::now();
        let reply = dispatch(engine.as_mut(), envelope.request).await;
        debug!(
            "Request {} ({}) handled in {}ms",
            envelope.id,
            action,
            start.elapsed().as_millis()
        );

        if envelope.reply.send(reply).is_err() {
            debug!("Reply to {} dropped: requester went away", envelope.id);
        }
    }

    rx.close();
    if let Err(e) = engine.close().await {
        warn!("Error closing engine: {}", e);
    }
    info!("Engine worker stopped");
}

/// Runs one request against the engine and shapes the reply.
async fn dispatch(engine: &mut dyn Engine, request: EngineRequest) -> EngineReply {
    let outcome = match request {
        EngineRequest::Open { buffer } => engine.open(buffer).await.map(|()| EngineReply::Ack),
        EngineRequest::Exec { sql } => engine.exec(&sql).await.map(EngineReply::Results),
        EngineRequest::Export => engine.export().await.map(EngineReply::Buffer),
    };

    outcome.unwrap_or_else(|e| match e {
        ConsoleError::Engine(message) => EngineReply::Error(message),
        other => EngineReply::Error(other.to_string()),
    })
}
