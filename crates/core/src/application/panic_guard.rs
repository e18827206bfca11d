// Panic isolation for bootstrap tasks
use crate::error::{AppError, Result};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Turn a panic inside `work` into [`AppError::Panicked`].
///
/// A panicking subsystem loader must still mark its status slot as failed,
/// so the panic has to become an ordinary error before the task runner sees it.
pub(crate) async fn guard<T, F>(work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let panic_msg = panic_message(&*payload);
            error!(panic_msg = %panic_msg, "Bootstrap task panicked");
            Err(AppError::Panicked(panic_msg))
        }
    }
}
