//! Orchestrator - parallel bootstrap of independent subsystems
//!
//! Every task is spawned at once next to the [`MinimumDurationGate`]:
//! - the join succeeds only when every task succeeds
//! - the first failure fails the join immediately; siblings keep running
//!   detached (no cancellation)
//! - the gate adds no payload, it only lower-bounds completion time

use crate::application::gate::MinimumDurationGate;
use crate::application::panic_guard::guard;
use crate::application::task_runner::TaskRunner;
use crate::error::{AppError, Result};
use crate::port::StatusReporter;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// One independently-loading startup unit
pub struct BootTask<T> {
    slot: String,
    label: Option<String>,
    work: BoxFuture<'static, Result<T>>,
}

impl<T> BootTask<T> {
    pub fn new<F>(slot: impl Into<String>, label: Option<String>, work: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            slot: slot.into(),
            label,
            work: work.boxed(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

pub struct Orchestrator {
    runner: TaskRunner,
    gate: MinimumDurationGate,
}

impl Orchestrator {
    pub fn new(status: Arc<dyn StatusReporter>, gate: MinimumDurationGate) -> Self {
        Self {
            runner: TaskRunner::new(status),
            gate,
        }
    }

    /// Run every task and the gate concurrently.
    ///
    /// Results come back in task order.
    pub async fn bootstrap<T: Send + 'static>(&self, tasks: Vec<BootTask<T>>) -> Result<Vec<T>> {
        let started = Instant::now();
        info!(
            task_count = tasks.len(),
            min_duration_ms = self.gate.duration().as_millis() as u64,
            "Bootstrapping subsystems"
        );

        // Spawned so a failing sibling does not cancel the others when the join bails out
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let runner = self.runner.clone();
                tokio::spawn(async move {
                    let BootTask { slot, label, work } = task;
                    runner.run(guard(work), &slot, label.as_deref()).await
                })
            })
            .collect();

        let tasks = try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(AppError::Internal(format!(
                    "startup task aborted: {}",
                    join_err
                ))),
            }
        }));
        let gate = async {
            self.gate.wait().await;
            Ok::<(), AppError>(())
        };

        let ((), results) = tokio::try_join!(gate, tasks)?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "All subsystems ready"
        );
        Ok(results)
    }
}
