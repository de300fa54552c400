use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use common::JobRequest;
use tokio::process::Child;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::handler::{CompletionSender, WorkerHandle};
use crate::monitor::Monitor;
use crate::registry::Registry;

/// Everything the per-handler supervisor task owns.
pub(crate) struct Supervision {
    pub registry: Arc<RwLock<Registry>>,
    pub monitor: Arc<dyn Monitor>,
    pub handler_id: String,
    pub request: Arc<JobRequest>,
    pub worker: WorkerHandle,
    pub tmp_dir: PathBuf,
    pub done: CompletionSender,
}

impl Supervision {
    /// Waits for the worker to exit, however it exits, then cleans up once.
    ///
    /// A failed worker is logged and otherwise treated like any other exit;
    /// reporting job failure upstream is the worker's business.
    pub async fn await_cleanup(self, mut child: Child) {
        let job_id = self.request.job_id.as_str();
        match child.wait().await {
            Ok(status) if status.success() => {
                info!(job_id, handler_id = %self.handler_id, "handler exited");
            }
            Ok(status) => {
                error!(job_id, handler_id = %self.handler_id, %status, "process failed");
            }
            Err(e) => {
                error!(job_id, handler_id = %self.handler_id, "failed to wait for process: {e}");
            }
        }
        self.worker.mark_reaped();
        self.cleanup().await;
    }

    async fn cleanup(self) {
        {
            let mut registry = self.registry.write().await;
            // Closing under the write lock means anyone who sees the signal
            // also sees the record gone.
            if !self.done.close() {
                return;
            }
            self.monitor.job_ended(&self.request);
            registry.remove(&self.request.job_id, &self.handler_id);
        }

        if let Err(e) = tokio::fs::remove_dir_all(&self.tmp_dir).await {
            if e.kind() != ErrorKind::NotFound {
                debug!(
                    job_id = %self.request.job_id,
                    "failed to remove {}: {e}",
                    self.tmp_dir.display()
                );
            }
        }
    }
}
