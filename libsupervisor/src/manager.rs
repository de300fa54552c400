use std::sync::Arc;

use common::{JobClass, JobRequest, ServiceConfig};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{LaunchError, SubmitError};
use crate::handler::Completion;
use crate::monitor::Monitor;
use crate::registry::Registry;

/// Admits jobs and supervises one worker process per admitted job.
///
/// All state lives in a single registry behind one reader/writer lock:
/// queries, admission and shutdown read it, launch and cleanup write it.
pub struct ProcessManager {
    pub(crate) conf: Arc<ServiceConfig>,
    pub(crate) monitor: Arc<dyn Monitor>,
    pub(crate) registry: Arc<RwLock<Registry>>,
}

impl ProcessManager {
    pub fn new(conf: ServiceConfig, monitor: Arc<dyn Monitor>) -> Self {
        Self {
            conf: Arc::new(conf),
            monitor,
            registry: Arc::new(RwLock::new(Registry::new())),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.conf
    }

    /// Point-in-time admission check. Advisory only; `submit` re-checks.
    pub async fn can_accept(&self, class: JobClass) -> bool {
        self.registry.read().await.can_accept(class)
    }

    /// Admits and launches a job, returning its handler id.
    ///
    /// Compositing admission and the exclusivity flag are decided under the
    /// write lock, so two compositing jobs can never both be admitted. Ordinary
    /// admission is a plain read and may interleave with other launches.
    pub async fn submit(&self, request: JobRequest) -> Result<String, SubmitError> {
        request.validate().map_err(LaunchError::from)?;
        let class = request.class();

        let admitted = match class {
            JobClass::Compositing => self.registry.write().await.reserve_compositing(),
            JobClass::Other => self.registry.read().await.can_accept(class),
        };
        if !admitted {
            debug!(job_id = %request.job_id, ?class, "no capacity, rejecting job");
            return Err(SubmitError::Rejected(request.job_id));
        }

        match self.launch(request).await {
            Ok(handler_id) => Ok(handler_id),
            Err(e) => {
                if class == JobClass::Compositing {
                    self.registry.write().await.release_compositing();
                }
                Err(e.into())
            }
        }
    }

    /// Completion signal of an active job, if it is still registered.
    pub async fn completion(&self, job_id: &str) -> Option<Completion> {
        self.registry
            .read()
            .await
            .get(job_id)
            .map(|record| record.done.clone())
    }
}
