use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::time::{Instant, sleep};
use tracing::{error, info};

use crate::manager::ProcessManager;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl ProcessManager {
    /// Asks every running worker to stop with SIGINT and returns at once.
    ///
    /// Records are left in place; each one is removed by its own supervisor
    /// when the worker actually exits.
    pub async fn shutdown(&self) {
        let registry = self.registry.read().await;
        for record in registry.records() {
            if record.done.is_done() {
                continue;
            }
            if let Err(e) = record.worker.signal(Signal::SIGINT) {
                error!(
                    job_id = %record.request.job_id,
                    handler_id = %record.handler_id,
                    "failed to kill process: {e}"
                );
            }
        }
    }

    /// Shuts down and polls until the registry is empty or `timeout` elapses.
    /// Returns whether every worker exited in time.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.shutdown().await;
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_idle().await {
                info!("all handlers drained");
                return true;
            }
            if Instant::now() >= deadline {
                let remaining = self.list_active().await;
                error!(?remaining, "drain timed out");
                return false;
            }
            sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}
