// Worker handshake
//
// Spawning -> AwaitingReady -> Ready      (resolves with a ReadyWorker)
// Spawning | AwaitingReady -> Failed      (spawn or transport failure)
use crate::domain::{WorkerMessage, WorkerRequest};
use crate::port::{WorkerChannel, WorkerEvent, WorkerSpawner};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("could not spawn worker: {0}")]
    Spawn(String),

    #[error("worker transport failed before ready: {0}")]
    Transport(String),

    #[error("worker channel closed before ready")]
    Closed,
}

/// A worker that has signalled readiness.
///
/// Only [`WorkerHandshake::handshake`] builds one, so nothing can send a
/// request to a worker that has not said `ready`.
pub struct ReadyWorker {
    pub(crate) requests: mpsc::Sender<WorkerRequest>,
    pub(crate) events: mpsc::Receiver<WorkerEvent>,
}

pub struct WorkerHandshake {
    spawner: Arc<dyn WorkerSpawner>,
}

impl WorkerHandshake {
    pub fn new(spawner: Arc<dyn WorkerSpawner>) -> Self {
        Self { spawner }
    }

    /// Spawn the worker and wait for its `ready` message.
    ///
    /// Malformed messages and messages of other kinds are logged and dropped;
    /// the handshake keeps waiting. No timeout is applied here.
    pub async fn handshake(&self) -> Result<ReadyWorker, HandshakeError> {
        let WorkerChannel {
            requests,
            mut events,
        } = self.spawner.spawn().await.map_err(|e| {
            error!(error = %e, "Worker spawn failed");
            HandshakeError::Spawn(e.to_string())
        })?;
        debug!("Worker spawned, awaiting ready message");

        while let Some(event) = events.recv().await {
            let raw = match event {
                WorkerEvent::Message(raw) => raw,
                WorkerEvent::TransportError(reason) => {
                    error!(reason = %reason, "Worker failed during handshake");
                    return Err(HandshakeError::Transport(reason));
                }
            };

            match WorkerMessage::parse(&raw) {
                Ok(WorkerMessage::Ready) => {
                    info!("Worker ready");
                    return Ok(ReadyWorker { requests, events });
                }
                Ok(other) => {
                    warn!(
                        kind = other.kind(),
                        "Unexpected worker message received before ready message"
                    );
                }
                Err(violation) => {
                    warn!(violation = %violation, message = %raw, "Illegal message sent by worker");
                }
            }
        }

        error!("Worker channel closed before ready");
        Err(HandshakeError::Closed)
    }
}
