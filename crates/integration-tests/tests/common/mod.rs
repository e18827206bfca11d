//! Shared fixtures for launcher scenarios
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use ptimer_core::application::constants::SUBMISSION_CHANNEL_CAPACITY;
use ptimer_core::domain::{ByteStream, ParsedFile};
use ptimer_core::port::{
    AppCore, AppHandle, AppLoader, AppSink, AssetBundle, AssetEntry, AssetLoader, SpawnError,
    WorkerChannel, WorkerSpawner,
};
use ptimer_core::{AppError, Result};

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub fn stream(bytes: &[u8]) -> ByteStream {
    Box::new(Cursor::new(bytes.to_vec()))
}

/// What the application saw through its sink
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Parsed(Value),
    ParseError(String),
    WorkerLost(String),
}

struct ChannelSink {
    events: mpsc::UnboundedSender<SinkEvent>,
}

impl AppSink for ChannelSink {
    fn receive_parsed_file(&self, file: ParsedFile) {
        self.events.send(SinkEvent::Parsed(file)).ok();
    }

    fn receive_file_parse_error(&self, message: String) {
        self.events.send(SinkEvent::ParseError(message)).ok();
    }

    fn receive_worker_lost(&self, reason: String) {
        self.events.send(SinkEvent::WorkerLost(reason)).ok();
    }
}

/// Test-side view of the application: init flag, submission sender, sink events
pub struct AppProbe {
    initialised: Arc<AtomicBool>,
    submitter: Arc<Mutex<Option<mpsc::Sender<ByteStream>>>>,
    pub events: mpsc::UnboundedReceiver<SinkEvent>,
}

impl AppProbe {
    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::SeqCst)
    }

    /// Sender the application uses to submit dropped files
    pub fn take_submitter(&self) -> mpsc::Sender<ByteStream> {
        self.submitter
            .lock()
            .unwrap()
            .take()
            .expect("application was not initialised")
    }

    pub async fn next_event(&mut self) -> SinkEvent {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("no sink event")
            .expect("sink dropped")
    }
}

pub struct TestAppLoader {
    delay: Duration,
    failure: Option<String>,
    initialised: Arc<AtomicBool>,
    submitter: Arc<Mutex<Option<mpsc::Sender<ByteStream>>>>,
    events: mpsc::UnboundedSender<SinkEvent>,
}

pub fn test_app(delay: Duration, failure: Option<&str>) -> (TestAppLoader, AppProbe) {
    let initialised = Arc::new(AtomicBool::new(false));
    let submitter = Arc::new(Mutex::new(None));
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        TestAppLoader {
            delay,
            failure: failure.map(str::to_string),
            initialised: initialised.clone(),
            submitter: submitter.clone(),
            events: event_tx,
        },
        AppProbe {
            initialised,
            submitter,
            events: event_rx,
        },
    )
}

#[async_trait]
impl AppLoader for TestAppLoader {
    async fn load(&self) -> Result<Box<dyn AppCore>> {
        tokio::time::sleep(self.delay).await;
        if let Some(message) = &self.failure {
            return Err(AppError::Core(message.clone()));
        }
        Ok(Box::new(TestCore {
            initialised: self.initialised.clone(),
            submitter: self.submitter.clone(),
            events: self.events.clone(),
        }))
    }
}

struct TestCore {
    initialised: Arc<AtomicBool>,
    submitter: Arc<Mutex<Option<mpsc::Sender<ByteStream>>>>,
    events: mpsc::UnboundedSender<SinkEvent>,
}

impl AppCore for TestCore {
    fn init(self: Box<Self>) -> AppHandle {
        self.initialised.store(true, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(SUBMISSION_CHANNEL_CAPACITY);
        *self.submitter.lock().unwrap() = Some(tx);
        AppHandle {
            sink: Arc::new(ChannelSink {
                events: self.events,
            }),
            submissions: rx,
        }
    }
}

pub struct TestAssets {
    delay: Duration,
    failure: Option<String>,
}

impl TestAssets {
    pub fn ok(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    pub fn failing(delay: Duration, message: &str) -> Self {
        Self {
            delay,
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl AssetLoader for TestAssets {
    async fn load(&self) -> Result<AssetBundle> {
        tokio::time::sleep(self.delay).await;
        match &self.failure {
            Some(message) => Err(AppError::Asset(message.clone())),
            None => Ok(AssetBundle {
                entries: vec![AssetEntry {
                    name: "app.css".to_string(),
                    bytes: 42,
                }],
            }),
        }
    }
}

/// Spawner that takes `delay` before handing over to `inner`
pub struct DelayedSpawner {
    delay: Duration,
    inner: Arc<dyn WorkerSpawner>,
}

impl DelayedSpawner {
    pub fn new(delay: Duration, inner: Arc<dyn WorkerSpawner>) -> Self {
        Self { delay, inner }
    }
}

#[async_trait]
impl WorkerSpawner for DelayedSpawner {
    async fn spawn(&self) -> std::result::Result<WorkerChannel, SpawnError> {
        tokio::time::sleep(self.delay).await;
        self.inner.spawn().await
    }
}
