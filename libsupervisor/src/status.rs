use std::collections::BTreeMap;

use common::JobKind;
use serde::Serialize;

use crate::manager::ProcessManager;

/// Load plus every active job's original request, keyed by job id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub cpu_load: f64,
    #[serde(flatten)]
    pub jobs: BTreeMap<String, JobKind>,
}

impl ProcessManager {
    pub async fn status(&self) -> ServiceStatus {
        let cpu_load = self.monitor.cpu_load();
        let registry = self.registry.read().await;
        let jobs = registry
            .records()
            .map(|record| (record.request.job_id.clone(), record.request.request.clone()))
            .collect();
        ServiceStatus { cpu_load, jobs }
    }

    pub async fn list_active(&self) -> Vec<String> {
        self.registry.read().await.job_ids()
    }

    pub async fn is_idle(&self) -> bool {
        self.registry.read().await.is_empty()
    }

    /// Whether a compositing job currently holds exclusive access.
    pub async fn handling_compositing(&self) -> bool {
        self.registry.read().await.handling_compositing()
    }
}
