// Task runner - status reporting around one bootstrap task
use crate::domain::{ErrorEntry, GENERIC_ERROR_MARKER};
use crate::port::{StatusError, StatusReporter};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Wraps a unit of startup work and mirrors its outcome into a status slot
#[derive(Clone)]
pub struct TaskRunner {
    status: Arc<dyn StatusReporter>,
}

impl TaskRunner {
    pub fn new(status: Arc<dyn StatusReporter>) -> Self {
        Self { status }
    }

    /// Run `work`, reporting its outcome to `slot`.
    ///
    /// The slot is set Pending first, which also checks the binding: a
    /// missing slot fails before the work is awaited. On failure the slot is
    /// marked Error and the error list updated before the error is returned,
    /// and the error comes back exactly as the task produced it.
    pub async fn run<T, E, F>(&self, work: F, slot: &str, label: Option<&str>) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<StatusError> + Display,
    {
        self.status.set_pending(slot)?;
        debug!(slot = %slot, label = ?label, "Startup task started");

        match work.await {
            Ok(value) => {
                self.status.set_ready(slot)?;
                debug!(slot = %slot, "Startup task ready");
                Ok(value)
            }
            Err(e) => {
                error!(slot = %slot, label = ?label, error = %e, "Startup task failed");

                let marker = label.unwrap_or(GENERIC_ERROR_MARKER);
                if let Err(status_err) = self.status.set_error(slot, marker) {
                    warn!(error = %status_err, "Could not mark failed slot");
                }
                self.status.push_error(ErrorEntry::new(label, e.to_string()));

                Err(e)
            }
        }
    }
}
