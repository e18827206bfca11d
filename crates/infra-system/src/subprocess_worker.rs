// Subprocess worker (stdio transport)
// reason: tokio::process for async pipes, env allowlisting for the child
//
// Wire format:
//   worker stdout: one JSON message per line (`ready`, `file_parsed`, `file_parse_error`)
//   worker stdin:  `{"type":"file_parse_request","length":N}\n` followed by N raw bytes
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use ptimer_core::application::constants::{
    EVENT_CHANNEL_CAPACITY, MAX_SUBMISSION_BYTES, MAX_WORKER_LINE_BYTES, REQUEST_CHANNEL_CAPACITY,
};
use ptimer_core::domain::message::TYPE_FILE_PARSE_REQUEST;
use ptimer_core::domain::WorkerRequest;
use ptimer_core::port::{SpawnError, WorkerChannel, WorkerEvent, WorkerSpawner};

use crate::submission::read_submission;

/// Runs the worker as a child process and talks to it over stdin/stdout.
///
/// Only allowlisted environment variables reach the child.
pub struct SubprocessWorkerSpawner {
    command: String,
    args: Vec<String>,
    env_allowlist: Vec<String>,
    max_line_bytes: u64,
    max_file_bytes: u64,
}

impl SubprocessWorkerSpawner {
    /// Create a new subprocess worker spawner
    ///
    /// # Example
    /// ```ignore
    /// let spawner = SubprocessWorkerSpawner::new("ptimer-worker", vec![])
    ///     .with_env_allowlist(vec!["PATH".to_string(), "HOME".to_string()]);
    /// ```
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env_allowlist: vec!["PATH".to_string(), "HOME".to_string()],
            max_line_bytes: MAX_WORKER_LINE_BYTES,
            max_file_bytes: MAX_SUBMISSION_BYTES,
        }
    }

    pub fn with_env_allowlist(mut self, env_allowlist: Vec<String>) -> Self {
        self.env_allowlist = env_allowlist;
        self
    }

    /// A longer stdout line is a protocol break: the worker is killed
    pub fn with_max_line_bytes(mut self, max_line_bytes: u64) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Files larger than this are answered with `file_parse_error`
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        env.filter(|(k, _)| self.env_allowlist.contains(k)).collect()
    }
}

#[async_trait]
impl WorkerSpawner for SubprocessWorkerSpawner {
    async fn spawn(&self) -> Result<WorkerChannel, SpawnError> {
        info!(command = %self.command, args = ?self.args, "Spawning worker process");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .env_clear()
            .envs(self.filter_env(std::env::vars()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpawnError::SpawnFailed(format!("{}: {}", self.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpawnError::SpawnFailed("worker stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpawnError::SpawnFailed("worker stdout not captured".to_string()))?;

        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(read_loop(
            stdout,
            child,
            event_tx.clone(),
            self.max_line_bytes,
        ));
        tokio::spawn(write_loop(stdin, request_rx, event_tx, self.max_file_bytes));

        Ok(WorkerChannel {
            requests: request_tx,
            events: event_rx,
        })
    }
}

/// Forward every stdout line as a raw message; report exit as a transport error.
///
/// Lines are read as bytes. Anything that is not JSON (including invalid
/// UTF-8) is forwarded as a lossy string and fails validation downstream.
async fn read_loop(
    stdout: ChildStdout,
    mut child: Child,
    events: mpsc::Sender<WorkerEvent>,
    max_line_bytes: u64,
) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();

    let failure = loop {
        buf.clear();
        let read = (&mut reader)
            .take(max_line_bytes.saturating_add(1))
            .read_until(b'\n', &mut buf)
            .await;
        match read {
            Ok(0) => break None,
            Ok(_) => {
                if buf.len() as u64 > max_line_bytes && buf.last() != Some(&b'\n') {
                    break Some(format!(
                        "worker sent a line longer than {} bytes",
                        max_line_bytes
                    ));
                }
                let line = trim_line(&buf);
                if line.is_empty() {
                    continue;
                }
                let raw = serde_json::from_slice::<Value>(line)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(line).into_owned()));
                trace!(raw = %raw, "Worker stdout line");
                if events.send(WorkerEvent::Message(raw)).await.is_err() {
                    debug!("Worker event receiver dropped, stopping read loop");
                    return;
                }
            }
            Err(e) => break Some(format!("failed to read worker stdout: {}", e)),
        }
    };

    // The child may still be alive and blocked on stdin
    if let Some(reason) = &failure {
        warn!(reason = %reason, "Worker stdout unusable, killing worker");
        if let Err(e) = child.start_kill() {
            warn!(error = %e, "Failed to kill worker process");
        }
    }

    let exit = match child.wait().await {
        Ok(status) => format!("worker process exited ({})", status),
        Err(e) => format!("worker process lost: {}", e),
    };
    let reason = match failure {
        Some(failure) => format!("{}; {}", failure, exit),
        None => exit,
    };
    info!(reason = %reason, "Worker stdout closed");
    events.send(WorkerEvent::TransportError(reason)).await.ok();
}

fn trim_line(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Write each request as a header line plus the raw payload.
async fn write_loop(
    mut stdin: ChildStdin,
    mut requests: mpsc::Receiver<WorkerRequest>,
    events: mpsc::Sender<WorkerEvent>,
    max_file_bytes: u64,
) {
    while let Some(request) = requests.recv().await {
        let WorkerRequest::FileParseRequest { data } = request;

        let payload = match read_submission(data, max_file_bytes).await {
            Ok(payload) => payload,
            Err(error) => {
                // Local read failure: the worker is fine, answer on its behalf
                warn!(error = %error, "Could not read submitted file");
                let reply = json!({"type": "file_parse_error", "error": error});
                events.send(WorkerEvent::Message(reply)).await.ok();
                continue;
            }
        };

        let header = json!({"type": TYPE_FILE_PARSE_REQUEST, "length": payload.len()});
        if let Err(e) = write_frame(&mut stdin, &header, &payload).await {
            error!(error = %e, "Failed to write to worker stdin");
            events
                .send(WorkerEvent::TransportError(format!(
                    "failed to write to worker: {}",
                    e
                )))
                .await
                .ok();
            return;
        }
        debug!(bytes = payload.len(), "File parse request written to worker");
    }
    // Dropping stdin signals EOF so the worker can exit
    debug!("Worker request channel closed");
}

async fn write_frame(stdin: &mut ChildStdin, header: &Value, payload: &[u8]) -> std::io::Result<()> {
    stdin.write_all(header.to_string().as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.write_all(payload).await?;
    stdin.flush().await
}
