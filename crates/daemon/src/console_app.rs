//! Console application core
//!
//! Stands in for the real application: paths given on the command line are
//! treated as dropped files. Each one is opened as an async byte stream and
//! submitted to the bridge, one at a time, waiting for its result before the
//! next. Results are printed to the terminal.

use async_trait::async_trait;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ptimer_core::application::constants::SUBMISSION_CHANNEL_CAPACITY;
use ptimer_core::application::ShutdownToken;
use ptimer_core::domain::{ByteStream, ParsedFile};
use ptimer_core::port::{AppCore, AppHandle, AppLoader, AppSink};
use ptimer_core::{AppError, Result};

pub struct ConsoleAppLoader {
    files: Vec<PathBuf>,
    shutdown: ShutdownToken,
}

impl ConsoleAppLoader {
    /// With no files the submission channel stays open until `shutdown`.
    pub fn new(files: Vec<PathBuf>, shutdown: ShutdownToken) -> Self {
        Self { files, shutdown }
    }
}

#[async_trait]
impl AppLoader for ConsoleAppLoader {
    async fn load(&self) -> Result<Box<dyn AppCore>> {
        for path in &self.files {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| AppError::Core(format!("{}: {}", path.display(), e)))?;
            if !metadata.is_file() {
                return Err(AppError::Core(format!("{}: not a file", path.display())));
            }
        }
        info!(files = self.files.len(), "Console application loaded");
        Ok(Box::new(ConsoleCore {
            files: self.files.clone(),
            shutdown: self.shutdown.clone(),
        }))
    }
}

struct ConsoleCore {
    files: Vec<PathBuf>,
    shutdown: ShutdownToken,
}

impl AppCore for ConsoleCore {
    fn init(self: Box<Self>) -> AppHandle {
        let (submit_tx, submit_rx) = mpsc::channel(SUBMISSION_CHANNEL_CAPACITY);
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        tokio::spawn(drop_source(self.files, submit_tx, reply_rx, self.shutdown));

        AppHandle {
            sink: Arc::new(ConsoleSink { replies: reply_tx }),
            submissions: submit_rx,
        }
    }
}

/// Submit each file and wait for the sink to report an answer.
///
/// Dropping `submissions` at the end tells the bridge the application is done.
async fn drop_source(
    files: Vec<PathBuf>,
    submissions: mpsc::Sender<ByteStream>,
    mut replies: mpsc::UnboundedReceiver<()>,
    mut shutdown: ShutdownToken,
) {
    if files.is_empty() {
        debug!("No files dropped, waiting for shutdown");
        shutdown.wait().await;
        return;
    }

    for path in files {
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not open dropped file");
                eprintln!("{} {}: {}", "skipped".yellow(), path.display(), e);
                continue;
            }
        };

        info!(path = %path.display(), "Submitting dropped file");
        if submissions.send(Box::new(file)).await.is_err() {
            debug!("Bridge stopped accepting files");
            return;
        }
        if replies.recv().await.is_none() {
            return;
        }
    }
    info!("All dropped files processed");
}

struct ConsoleSink {
    replies: mpsc::UnboundedSender<()>,
}

impl ConsoleSink {
    fn answered(&self) {
        self.replies.send(()).ok();
    }
}

impl AppSink for ConsoleSink {
    fn receive_parsed_file(&self, file: ParsedFile) {
        let rendered = serde_json::to_string_pretty(&file).unwrap_or_else(|_| file.to_string());
        println!("{}\n{}", "parsed".green().bold(), rendered);
        self.answered();
    }

    fn receive_file_parse_error(&self, message: String) {
        println!("{} {}", "parse error".red().bold(), message);
        self.answered();
    }

    fn receive_worker_lost(&self, reason: String) {
        println!("{} {}", "worker lost".red().bold(), reason);
        self.answered();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptimer_core::application::shutdown_channel;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ptimer_drop_{}_{}", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_fails_core_load() {
        let (_tx, token) = shutdown_channel();
        let loader = ConsoleAppLoader::new(vec![PathBuf::from("/nonexistent/drop.json")], token);
        assert!(matches!(loader.load().await, Err(AppError::Core(_))));
    }

    #[tokio::test]
    async fn test_files_are_submitted_one_at_a_time() {
        let first = temp_file("first", "{}");
        let second = temp_file("second", "[]");
        let (_tx, token) = shutdown_channel();

        let core = ConsoleAppLoader::new(vec![first.clone(), second.clone()], token)
            .load()
            .await
            .unwrap();
        let mut app = core.init();

        let wait = Duration::from_secs(5);
        timeout(wait, app.submissions.recv()).await.unwrap().unwrap();
        // Nothing more until the first answer arrives
        assert!(timeout(Duration::from_millis(50), app.submissions.recv()).await.is_err());

        app.sink.receive_parsed_file(json!({"bytes": 2}));
        timeout(wait, app.submissions.recv()).await.unwrap().unwrap();

        app.sink.receive_file_parse_error("bad header".to_string());
        assert!(timeout(wait, app.submissions.recv()).await.unwrap().is_none());

        std::fs::remove_file(first).unwrap();
        std::fs::remove_file(second).unwrap();
    }

    #[tokio::test]
    async fn test_no_files_holds_channel_until_shutdown() {
        let (tx, token) = shutdown_channel();
        let core = ConsoleAppLoader::new(vec![], token).load().await.unwrap();
        let mut app = core.init();

        assert!(timeout(Duration::from_millis(50), app.submissions.recv()).await.is_err());

        tx.shutdown();
        let closed = timeout(Duration::from_secs(5), app.submissions.recv()).await.unwrap();
        assert!(closed.is_none());
    }
}
