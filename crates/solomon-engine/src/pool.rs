//! Supervised background work: conversation turns and tool executions.
//!
//! Tasks are tracked so callers can wait for the engine to go quiet, and all
//! of them stop when the pool's root token is cancelled. A panicking task is
//! logged and contained.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

#[derive(Clone, Default)]
pub struct WorkPool {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl WorkPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when the pool shuts down, for per-session cancellation.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(task = label, "Background task cancelled");
                }
                outcome = AssertUnwindSafe(task).catch_unwind() => {
                    if outcome.is_err() {
                        error!(task = label, "Background task panicked");
                    }
                }
            }
        });
    }

    /// Wait until every task, including ones spawned meanwhile by other tasks,
    /// has finished. Meant for one waiter at a time.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel every task and wait for them to stop.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
