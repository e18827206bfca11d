//! Request/response bridge between the running application and the worker
//!
//! Outbound, file submissions become `file_parse_request` messages that move
//! the byte stream into the worker. Inbound, every worker message is
//! validated and routed by kind:
//! - `file_parsed` goes to the application unchanged
//! - `file_parse_error` is logged and relayed as plain text
//! - anything else is logged as illegal and dropped
//!
//! The protocol carries no request ids, so submissions are serialized: while
//! one request is outstanding a second one is rejected with
//! [`BridgeError::RequestInFlight`].
//!
//! A transport failure after the handshake degrades the bridge: the
//! application is told through [`AppSink::receive_worker_lost`] and later
//! submissions fail with [`BridgeError::WorkerUnavailable`].

use crate::application::handshake::ReadyWorker;
use crate::application::shutdown::ShutdownToken;
use crate::domain::{normalize_error, ByteStream, WorkerMessage, WorkerRequest};
use crate::port::{AppSink, WorkerEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("a file is already being parsed; wait for its result before submitting another")]
    RequestInFlight,

    #[error("worker unavailable: {0}")]
    WorkerUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Live,
    /// The worker is gone; carries the reason
    Degraded(String),
}

pub struct Bridge {
    requests: mpsc::Sender<WorkerRequest>,
    events: mpsc::Receiver<WorkerEvent>,
    sink: Arc<dyn AppSink>,
    in_flight: bool,
    state: BridgeState,
}

impl Bridge {
    pub fn new(worker: ReadyWorker, sink: Arc<dyn AppSink>) -> Self {
        Self {
            requests: worker.requests,
            events: worker.events,
            sink,
            in_flight: false,
            state: BridgeState::Live,
        }
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Transfer `data` to the worker as a `file_parse_request`.
    pub async fn submit_file(&mut self, data: ByteStream) -> Result<(), BridgeError> {
        if let BridgeState::Degraded(reason) = &self.state {
            return Err(BridgeError::WorkerUnavailable(reason.clone()));
        }
        if self.in_flight {
            return Err(BridgeError::RequestInFlight);
        }

        let request = WorkerRequest::FileParseRequest { data };
        if self.requests.send(request).await.is_err() {
            let reason = "worker request channel closed".to_string();
            self.degrade(reason.clone());
            return Err(BridgeError::WorkerUnavailable(reason));
        }

        self.in_flight = true;
        debug!("File parse request sent to worker");
        Ok(())
    }

    /// Route one inbound worker event.
    pub fn dispatch(&mut self, event: WorkerEvent) {
        let raw = match event {
            WorkerEvent::Message(raw) => raw,
            WorkerEvent::TransportError(reason) => {
                self.degrade(reason);
                return;
            }
        };

        match WorkerMessage::parse(&raw) {
            Ok(WorkerMessage::FileParsed { file }) => {
                self.in_flight = false;
                debug!("File parsed by worker");
                self.sink.receive_parsed_file(file);
            }
            Ok(WorkerMessage::FileParseError { error }) => {
                self.in_flight = false;
                warn!(error = %error, "Worker could not parse file");
                self.sink.receive_file_parse_error(normalize_error(&error));
            }
            Ok(WorkerMessage::Ready) => {
                warn!("Duplicate ready message from worker ignored");
            }
            Err(violation) => {
                warn!(violation = %violation, message = %raw, "Illegal message sent by worker");
            }
        }
    }

    fn degrade(&mut self, reason: String) {
        if self.state != BridgeState::Live {
            return;
        }
        error!(reason = %reason, "Worker lost after handshake, session degraded");
        self.in_flight = false;
        self.state = BridgeState::Degraded(reason.clone());
        self.sink.receive_worker_lost(reason);
    }

    /// Dispatch loop: relay submissions out and worker messages back until
    /// shutdown or until the application closes its submission channel.
    ///
    /// A request still in flight when submissions close is answered before
    /// the loop ends, unless the worker is lost first. Returns the final
    /// bridge state.
    pub async fn run(
        mut self,
        mut submissions: mpsc::Receiver<ByteStream>,
        mut shutdown: ShutdownToken,
    ) -> BridgeState {
        info!("Bridge started");
        let mut accepting = true;
        loop {
            if shutdown.is_shutdown() {
                info!("Bridge shutting down");
                break;
            }
            if !accepting && !self.in_flight {
                break;
            }

            let live = self.state == BridgeState::Live;
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Bridge interrupted by shutdown");
                    break;
                }
                event = self.events.recv(), if live => match event {
                    Some(event) => self.dispatch(event),
                    None => self.degrade("worker channel closed".to_string()),
                },
                submission = submissions.recv(), if accepting => match submission {
                    Some(data) => {
                        if let Err(e) = self.submit_file(data).await {
                            warn!(error = %e, "File submission rejected");
                            self.sink.receive_file_parse_error(e.to_string());
                        }
                    }
                    None => {
                        info!(
                            in_flight = self.in_flight,
                            "Application closed its submission channel"
                        );
                        accepting = false;
                    }
                },
            }
        }
        info!(state = ?self.state, "Bridge stopped");
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handshake::WorkerHandshake;
    use crate::application::shutdown::shutdown_channel;
    use crate::port::app::MockAppSink;
    use crate::port::worker_spawner::mocks::{ScriptedWorkerSpawner, WorkerRemote};
    use mockall::predicate::eq;
    use serde_json::json;
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;

    async fn ready_worker() -> (ReadyWorker, WorkerRemote) {
        let (spawner, remote) = ScriptedWorkerSpawner::new();
        remote.emit(json!({"type": "ready"})).await;
        let worker = WorkerHandshake::new(Arc::new(spawner))
            .handshake()
            .await
            .unwrap();
        (worker, remote)
    }

    fn stream(bytes: &[u8]) -> ByteStream {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    #[tokio::test]
    async fn test_submit_transfers_stream_to_worker() {
        let (worker, mut remote) = ready_worker().await;
        let mut bridge = Bridge::new(worker, Arc::new(MockAppSink::new()));

        bridge.submit_file(stream(b"PTIMER")).await.unwrap();
        assert!(bridge.is_in_flight());

        let WorkerRequest::FileParseRequest { mut data } = remote.requests.recv().await.unwrap();
        let mut received = Vec::new();
        data.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"PTIMER");
    }

    #[tokio::test]
    async fn test_parsed_file_relayed_unchanged() {
        let (worker, _remote) = ready_worker().await;
        let payload = json!({"metadata": {"title": "Tea"}, "steps": [{"duration": 180}]});

        let mut sink = MockAppSink::new();
        sink.expect_receive_parsed_file()
            .with(eq(payload.clone()))
            .times(1)
            .return_const(());
        sink.expect_receive_file_parse_error().never();
        let mut bridge = Bridge::new(worker, Arc::new(sink));

        bridge.submit_file(stream(b"x")).await.unwrap();
        bridge.dispatch(WorkerEvent::Message(
            json!({"type": "file_parsed", "file": payload}),
        ));
        assert!(!bridge.is_in_flight());
    }

    #[tokio::test]
    async fn test_parse_error_relayed_as_text() {
        let (worker, _remote) = ready_worker().await;
        let mut sink = MockAppSink::new();
        sink.expect_receive_file_parse_error()
            .with(eq("bad header".to_string()))
            .times(1)
            .return_const(());
        sink.expect_receive_file_parse_error()
            .with(eq("bad magic".to_string()))
            .times(1)
            .return_const(());
        let mut bridge = Bridge::new(worker, Arc::new(sink));

        bridge.dispatch(WorkerEvent::Message(
            json!({"type": "file_parse_error", "error": "bad header"}),
        ));
        bridge.dispatch(WorkerEvent::Message(
            json!({"type": "file_parse_error", "error": {"name": "ParseError", "message": "bad magic"}}),
        ));
        assert_eq!(bridge.state(), &BridgeState::Live);
    }

    #[tokio::test]
    async fn test_illegal_messages_are_dropped() {
        let (worker, _remote) = ready_worker().await;
        let mut sink = MockAppSink::new();
        sink.expect_receive_parsed_file().never();
        sink.expect_receive_file_parse_error().never();
        sink.expect_receive_worker_lost().never();
        let mut bridge = Bridge::new(worker, Arc::new(sink));

        bridge.submit_file(stream(b"x")).await.unwrap();
        bridge.dispatch(WorkerEvent::Message(json!(null)));
        bridge.dispatch(WorkerEvent::Message(json!({"type": "file_parsed"})));
        bridge.dispatch(WorkerEvent::Message(json!({"type": "ready"})));

        // Still waiting for the real answer
        assert!(bridge.is_in_flight());
        assert_eq!(bridge.state(), &BridgeState::Live);
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_in_flight() {
        let (worker, mut remote) = ready_worker().await;
        let mut sink = MockAppSink::new();
        sink.expect_receive_parsed_file().times(1).return_const(());
        let mut bridge = Bridge::new(worker, Arc::new(sink));

        bridge.submit_file(stream(b"first")).await.unwrap();
        assert_eq!(
            bridge.submit_file(stream(b"second")).await,
            Err(BridgeError::RequestInFlight)
        );

        bridge.dispatch(WorkerEvent::Message(json!({"type": "file_parsed", "file": 1})));
        bridge.submit_file(stream(b"third")).await.unwrap();

        assert!(remote.requests.recv().await.is_some());
        assert!(remote.requests.recv().await.is_some());
        assert!(remote.requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_session() {
        let (worker, _remote) = ready_worker().await;
        let mut sink = MockAppSink::new();
        sink.expect_receive_worker_lost()
            .with(eq("worker crashed".to_string()))
            .times(1)
            .return_const(());
        let mut bridge = Bridge::new(worker, Arc::new(sink));

        bridge.dispatch(WorkerEvent::TransportError("worker crashed".to_string()));
        bridge.dispatch(WorkerEvent::TransportError("again".to_string()));

        assert_eq!(
            bridge.state(),
            &BridgeState::Degraded("worker crashed".to_string())
        );
        assert_eq!(
            bridge.submit_file(stream(b"x")).await,
            Err(BridgeError::WorkerUnavailable("worker crashed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_run_loop_round_trip() {
        let (worker, mut remote) = ready_worker().await;
        let (parsed_tx, mut parsed_rx) = mpsc::unbounded_channel();
        let mut sink = MockAppSink::new();
        sink.expect_receive_parsed_file()
            .times(1)
            .returning(move |file| {
                parsed_tx.send(file).ok();
            });
        let bridge = Bridge::new(worker, Arc::new(sink));

        let (submit_tx, submit_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown) = shutdown_channel();
        let loop_handle = tokio::spawn(bridge.run(submit_rx, shutdown));

        submit_tx.send(stream(b"timer")).await.unwrap();
        let request = remote.requests.recv().await.unwrap();
        assert_eq!(request.kind(), "file_parse_request");
        remote
            .emit(json!({"type": "file_parsed", "file": {"ok": true}}))
            .await;

        assert_eq!(parsed_rx.recv().await.unwrap(), json!({"ok": true}));

        shutdown_tx.shutdown();
        assert_eq!(loop_handle.await.unwrap(), BridgeState::Live);
    }

    #[tokio::test]
    async fn test_run_loop_ends_when_application_closes_submissions() {
        let (worker, _remote) = ready_worker().await;
        let bridge = Bridge::new(worker, Arc::new(MockAppSink::new()));
        let (submit_tx, submit_rx) = mpsc::channel::<ByteStream>(1);
        let (_shutdown_tx, shutdown) = shutdown_channel();

        drop(submit_tx);
        assert_eq!(bridge.run(submit_rx, shutdown).await, BridgeState::Live);
    }

    #[tokio::test]
    async fn test_run_loop_delivers_reply_after_submissions_close() {
        let (worker, mut remote) = ready_worker().await;
        let (parsed_tx, mut parsed_rx) = mpsc::unbounded_channel();
        let mut sink = MockAppSink::new();
        sink.expect_receive_parsed_file()
            .times(1)
            .returning(move |file| {
                parsed_tx.send(file).ok();
            });
        let bridge = Bridge::new(worker, Arc::new(sink));
        let (submit_tx, submit_rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown) = shutdown_channel();
        let loop_handle = tokio::spawn(bridge.run(submit_rx, shutdown));

        submit_tx.send(stream(b"last")).await.unwrap();
        drop(submit_tx);
        remote.requests.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!loop_handle.is_finished());

        remote
            .emit(json!({"type": "file_parsed", "file": {"last": true}}))
            .await;

        assert_eq!(parsed_rx.recv().await.unwrap(), json!({"last": true}));
        assert_eq!(loop_handle.await.unwrap(), BridgeState::Live);
    }

    #[tokio::test]
    async fn test_run_loop_stops_waiting_when_worker_lost_after_close() {
        let (worker, mut remote) = ready_worker().await;
        let mut sink = MockAppSink::new();
        sink.expect_receive_worker_lost()
            .with(eq("worker crashed".to_string()))
            .times(1)
            .return_const(());
        let bridge = Bridge::new(worker, Arc::new(sink));
        let (submit_tx, submit_rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown) = shutdown_channel();
        let loop_handle = tokio::spawn(bridge.run(submit_rx, shutdown));

        submit_tx.send(stream(b"last")).await.unwrap();
        drop(submit_tx);
        remote.requests.recv().await.unwrap();
        remote.fail("worker crashed").await;

        assert_eq!(
            loop_handle.await.unwrap(),
            BridgeState::Degraded("worker crashed".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_loop_degrades_when_worker_exits() {
        let (worker, remote) = ready_worker().await;
        let (lost_tx, mut lost_rx) = mpsc::unbounded_channel();
        let mut sink = MockAppSink::new();
        sink.expect_receive_worker_lost()
            .times(1)
            .returning(move |reason| {
                lost_tx.send(reason).ok();
            });
        let bridge = Bridge::new(worker, Arc::new(sink));
        let (_submit_tx, submit_rx) = mpsc::channel::<ByteStream>(1);
        let (shutdown_tx, shutdown) = shutdown_channel();
        let loop_handle = tokio::spawn(bridge.run(submit_rx, shutdown));

        drop(remote);
        assert_eq!(lost_rx.recv().await.unwrap(), "worker channel closed");

        shutdown_tx.shutdown();
        assert_eq!(
            loop_handle.await.unwrap(),
            BridgeState::Degraded("worker channel closed".to_string())
        );
    }
}
