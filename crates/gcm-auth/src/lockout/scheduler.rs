//! Delayed unblock tasks.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Runs account unblocks after a delay.
///
/// Tasks are tracked so shutdown can cancel the ones still sleeping and
/// wait for the ones already running. Individual tasks cannot be cancelled.
#[derive(Debug, Clone, Default)]
pub struct UnblockScheduler {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl UnblockScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once `delay` has elapsed, unless shutdown comes first.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.tracker.is_closed() {
            warn!("Unblock scheduled after shutdown, ignoring");
            return;
        }

        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Pending unblock cancelled by shutdown");
                }
                _ = tokio::time::sleep(delay) => {
                    task.await;
                }
            }
        });
    }

    /// Number of tasks not yet finished.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Cancel sleeping tasks and wait up to `grace` for the rest.
    pub async fn shutdown(&self, grace: Duration) {
        self.cancel.cancel();
        self.tracker.close();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                pending = self.tracker.len(),
                "Unblock tasks did not finish within the grace period"
            );
        } else {
            info!("Unblock scheduler stopped");
        }
    }
}
