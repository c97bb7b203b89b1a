//! One client connection.

use std::{collections::HashMap, fmt::Display};

use futures::{Sink, SinkExt, Stream, StreamExt, future::join_all};
use present_core::{Kind, Message};
use present_executor::{Orchestrator, Process, StartRequest};
use tokio::sync::mpsc;

use crate::error::SessionError;

const INBOUND_CAPACITY: usize = 16;
const OUTBOUND_CAPACITY: usize = 256;

/// Multiplexes executions over a single connection.
#[derive(Debug, Clone)]
pub struct Session {
    orchestrator: Orchestrator,
}

impl Session {
    /// Create a session starting executions with `orchestrator`.
    #[must_use]
    pub const fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Serve a connection until it closes or fails.
    ///
    /// `reader` yields one JSON message per item; every event is written to
    /// `writer` as one JSON message. On return all executions started by this
    /// session have been killed.
    ///
    /// # Errors
    /// Returns the transport or protocol error that ended the session. A clean
    /// close of `reader` is not an error.
    pub async fn run<R, W, E>(self, reader: R, writer: W) -> Result<(), SessionError>
    where
        R: Stream<Item = Result<String, E>> + Send + Unpin + 'static,
        E: Display + Send + 'static,
        W: Sink<String> + Send + Unpin + 'static,
        W::Error: Display + Send,
    {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (err_tx, mut err_rx) = mpsc::channel(2);

        let decoder = tokio::spawn(decode(reader, inbound_tx, err_tx.clone()));
        let encoder = tokio::spawn(encode(out_rx, writer, err_tx));

        let mut processes: HashMap<String, Process> = HashMap::new();
        let result = loop {
            tokio::select! {
                biased;
                Some(msg) = inbound_rx.recv() => {
                    self.dispatch(msg, &mut processes, &out_tx).await;
                }
                Some(err) = err_rx.recv() => break err,
                else => break SessionError::Closed,
            }
        };

        match &result {
            SessionError::Closed => tracing::debug!("Session closed by client"),
            err => tracing::warn!("Session ended: {err}"),
        }

        join_all(processes.values().map(Process::kill)).await;
        drop(processes);
        drop(out_tx);
        decoder.abort();
        let _ = encoder.await;

        match result {
            SessionError::Closed => Ok(()),
            err => Err(err),
        }
    }

    async fn dispatch(
        &self,
        msg: Message,
        processes: &mut HashMap<String, Process>,
        out: &mpsc::Sender<Message>,
    ) {
        match msg.kind {
            Kind::Kill => {
                if let Some(process) = processes.get(&msg.id) {
                    tracing::info!(id = %msg.id, "Kill requested");
                    process.kill().await;
                }
            }
            kind if kind.is_event() => {
                tracing::debug!(id = %msg.id, ?kind, "Ignoring event sent by client");
            }
            _ => {
                let working_dir = match processes.remove(&msg.id) {
                    Some(previous) => {
                        previous.kill().await;
                        previous.into_working_dir()
                    }
                    None => None,
                };
                let Some(request) = StartRequest::from_message(msg, working_dir) else {
                    return;
                };
                let id = request.id.clone();
                tracing::info!(%id, backend = %request.backend, "Starting execution");
                if let Some(process) = self.orchestrator.start(request, out.clone()).await {
                    processes.insert(id, process);
                }
            }
        }
    }
}

async fn decode<R, E>(
    mut reader: R,
    inbound: mpsc::Sender<Message>,
    errors: mpsc::Sender<SessionError>,
) where
    R: Stream<Item = Result<String, E>> + Unpin,
    E: Display,
{
    let err = loop {
        match reader.next().await {
            None => break SessionError::Closed,
            Some(Err(e)) => break SessionError::Transport(e.to_string()),
            Some(Ok(frame)) => match Message::decode(&frame) {
                Ok(msg) => {
                    if inbound.send(msg).await.is_err() {
                        return;
                    }
                }
                Err(e) => break e.into(),
            },
        }
    };
    let _ = errors.send(err).await;
}

async fn encode<W>(
    mut out: mpsc::Receiver<Message>,
    mut writer: W,
    errors: mpsc::Sender<SessionError>,
) where
    W: Sink<String> + Unpin,
    W::Error: Display,
{
    while let Some(msg) = out.recv().await {
        let frame = match msg.encode() {
            Ok(frame) => frame,
            Err(e) => {
                let _ = errors.send(e.into()).await;
                return;
            }
        };
        if let Err(e) = writer.send(frame).await.map_err(|e| e.to_string()) {
            let _ = errors.send(SessionError::Transport(e)).await;
            return;
        }
    }
    let _ = writer.close().await;
}
