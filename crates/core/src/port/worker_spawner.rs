// Worker spawning port
// reason: async-trait, spawning may touch the OS (process) or the runtime (task)
use crate::domain::WorkerRequest;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Something observed on the worker's inbound side
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A raw, not yet validated message
    Message(Value),
    /// The transport itself failed (crash, broken pipe, exit)
    TransportError(String),
}

/// Both ends the launcher holds on a freshly spawned worker
pub struct WorkerChannel {
    pub requests: mpsc::Sender<WorkerRequest>,
    pub events: mpsc::Receiver<WorkerEvent>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
}

/// Worker Spawner trait
///
/// Implementations must create the event channel before the worker starts
/// running, so the initial `ready` message is buffered rather than lost.
///
/// Implementations:
/// - ThreadWorkerSpawner: runs a parser on the tokio runtime's blocking pool
/// - SubprocessWorkerSpawner: talks to a child process over stdio
#[async_trait]
pub trait WorkerSpawner: Send + Sync {
    async fn spawn(&self) -> Result<WorkerChannel, SpawnError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Test-side end of a scripted worker
    pub struct WorkerRemote {
        pub events: mpsc::Sender<WorkerEvent>,
        pub requests: mpsc::Receiver<WorkerRequest>,
    }

    impl WorkerRemote {
        pub async fn emit(&self, message: Value) {
            self.events.send(WorkerEvent::Message(message)).await.ok();
        }

        pub async fn fail(&self, reason: impl Into<String>) {
            self.events
                .send(WorkerEvent::TransportError(reason.into()))
                .await
                .ok();
        }
    }

    /// Spawner whose worker is driven by the test through a [`WorkerRemote`]
    pub struct ScriptedWorkerSpawner {
        channel: Mutex<Option<WorkerChannel>>,
        spawn_error: Option<String>,
    }

    impl ScriptedWorkerSpawner {
        pub fn new() -> (Self, WorkerRemote) {
            let (request_tx, request_rx) = mpsc::channel(8);
            let (event_tx, event_rx) = mpsc::channel(64);
            let spawner = Self {
                channel: Mutex::new(Some(WorkerChannel {
                    requests: request_tx,
                    events: event_rx,
                })),
                spawn_error: None,
            };
            let remote = WorkerRemote {
                events: event_tx,
                requests: request_rx,
            };
            (spawner, remote)
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                channel: Mutex::new(None),
                spawn_error: Some(message.into()),
            }
        }
    }

    #[async_trait]
    impl WorkerSpawner for ScriptedWorkerSpawner {
        async fn spawn(&self) -> Result<WorkerChannel, SpawnError> {
            if let Some(message) = &self.spawn_error {
                return Err(SpawnError::SpawnFailed(message.clone()));
            }
            self.channel
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| SpawnError::SpawnFailed("worker already spawned".to_string()))
        }
    }
}
