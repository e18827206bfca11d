// In-process worker
// reason: tokio task for the message loop, blocking pool for the parse itself
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use ptimer_core::application::constants::{
    EVENT_CHANNEL_CAPACITY, MAX_SUBMISSION_BYTES, REQUEST_CHANNEL_CAPACITY,
};
use ptimer_core::domain::{ByteStream, WorkerMessage, WorkerRequest};
use ptimer_core::port::{FileParser, SpawnError, WorkerChannel, WorkerEvent, WorkerSpawner};

use crate::submission::read_submission;

/// Spawns a worker that runs a [`FileParser`] off the launcher's task.
///
/// Speaks the same message protocol as an out-of-process worker: `ready`
/// first, then one `file_parsed` or `file_parse_error` per request. A panic
/// in the parser is reported as a transport failure and ends the worker.
pub struct ThreadWorkerSpawner {
    parser: Arc<dyn FileParser>,
    max_file_bytes: u64,
}

impl ThreadWorkerSpawner {
    pub fn new(parser: Arc<dyn FileParser>) -> Self {
        Self {
            parser,
            max_file_bytes: MAX_SUBMISSION_BYTES,
        }
    }

    /// Files larger than this are answered with `file_parse_error`
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }
}

#[async_trait]
impl WorkerSpawner for ThreadWorkerSpawner {
    async fn spawn(&self) -> Result<WorkerChannel, SpawnError> {
        // Channels exist before the worker runs, so `ready` cannot be missed
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(worker_loop(
            Arc::clone(&self.parser),
            self.max_file_bytes,
            request_rx,
            event_tx,
        ));
        info!("In-process worker spawned");

        Ok(WorkerChannel {
            requests: request_tx,
            events: event_rx,
        })
    }
}

async fn worker_loop(
    parser: Arc<dyn FileParser>,
    max_file_bytes: u64,
    mut requests: mpsc::Receiver<WorkerRequest>,
    events: mpsc::Sender<WorkerEvent>,
) {
    let ready = WorkerEvent::Message(WorkerMessage::Ready.to_value());
    if events.send(ready).await.is_err() {
        return;
    }

    while let Some(request) = requests.recv().await {
        let WorkerRequest::FileParseRequest { data } = request;
        let event = match handle_request(&parser, data, max_file_bytes).await {
            Ok(reply) => WorkerEvent::Message(reply.to_value()),
            Err(crash) => {
                error!(reason = %crash, "In-process worker crashed");
                events.send(WorkerEvent::TransportError(crash)).await.ok();
                return;
            }
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
    debug!("In-process worker stopped");
}

/// Parse one transferred stream. `Err` means the worker itself died.
async fn handle_request(
    parser: &Arc<dyn FileParser>,
    data: ByteStream,
    max_file_bytes: u64,
) -> Result<WorkerMessage, String> {
    let bytes = match read_submission(data, max_file_bytes).await {
        Ok(bytes) => bytes,
        Err(error) => return Ok(WorkerMessage::FileParseError { error }),
    };
    debug!(bytes = bytes.len(), "Received file for parsing");

    let parser = Arc::clone(parser);
    match tokio::task::spawn_blocking(move || parser.parse(&bytes)).await {
        Ok(Ok(file)) => Ok(WorkerMessage::FileParsed { file }),
        Ok(Err(parse_err)) => {
            let error = serde_json::to_value(&parse_err)
                .unwrap_or_else(|_| Value::String(parse_err.to_string()));
            Ok(WorkerMessage::FileParseError { error })
        }
        Err(join_err) => Err(format!("parser task failed: {}", join_err)),
    }
}
