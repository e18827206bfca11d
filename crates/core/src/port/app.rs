// Application core port
//
// The application itself (business logic, rendering, state) is external.
// The launcher only loads it, initialises it once every subsystem is warm,
// and wires its file submissions and result sinks to the worker bridge.
use crate::domain::{ByteStream, ParsedFile};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Loads the application core (the first bootstrap task)
#[async_trait]
pub trait AppLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn AppCore>>;
}

/// A loaded but not yet initialised application core
pub trait AppCore: Send {
    /// Start the application. Called only after every bootstrap task succeeded.
    fn init(self: Box<Self>) -> AppHandle;
}

/// Running application, as seen by the bridge
pub struct AppHandle {
    /// Where worker results are delivered
    pub sink: Arc<dyn AppSink>,
    /// Outgoing file submissions (e.g. dropped files)
    pub submissions: mpsc::Receiver<ByteStream>,
}

/// Incoming-event sink points of the application
#[cfg_attr(test, mockall::automock)]
pub trait AppSink: Send + Sync {
    fn receive_parsed_file(&self, file: ParsedFile);

    fn receive_file_parse_error(&self, message: String);

    /// The worker died after the handshake; the session is degraded
    fn receive_worker_lost(&self, reason: String);
}
