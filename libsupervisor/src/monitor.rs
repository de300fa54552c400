use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{JobClass, JobRequest};
use serde::Serialize;
use sysinfo::System;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

/// Telemetry sink notified around every job's lifetime.
///
/// Calls are made on the launch and cleanup paths, so implementations
/// should return quickly and never block on I/O.
pub trait Monitor: Send + Sync {
    fn job_started(&self, request: &JobRequest);

    fn job_ended(&self, request: &JobRequest);

    /// Host load as a fraction in `0.0..=1.0`. Read from the status path, so
    /// it must return a cached value rather than sample the host.
    fn cpu_load(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub started: u64,
    pub ended: u64,
    pub active_compositing: usize,
    pub active_other: usize,
}

/// Default monitor: job counters plus host CPU usage from `sysinfo`.
///
/// CPU usage is sampled by [`SystemMonitor::spawn_sampler`]; until the first
/// sample `cpu_load` reports zero.
pub struct SystemMonitor {
    system: Mutex<System>,
    cpu_load: AtomicU64,
    started: AtomicU64,
    ended: AtomicU64,
    active_compositing: AtomicUsize,
    active_other: AtomicUsize,
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        // cpu usage is computed between two refreshes
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            cpu_load: AtomicU64::new(0f64.to_bits()),
            started: AtomicU64::new(0),
            ended: AtomicU64::new(0),
            active_compositing: AtomicUsize::new(0),
            active_other: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            started: self.started.load(Ordering::Relaxed),
            ended: self.ended.load(Ordering::Relaxed),
            active_compositing: self.active_compositing.load(Ordering::Relaxed),
            active_other: self.active_other.load(Ordering::Relaxed),
        }
    }

    /// Refreshes host CPU usage from `/proc`. Blocking.
    pub fn sample_cpu(&self) {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_cpu();
        let usage = (f64::from(system.global_cpu_info().cpu_usage()) / 100.0).clamp(0.0, 1.0);
        self.cpu_load.store(usage.to_bits(), Ordering::Relaxed);
    }

    /// Samples CPU usage every `period` on the blocking pool until aborted.
    pub fn spawn_sampler(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let monitor = self.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || monitor.sample_cpu()).await {
                    debug!("cpu sampling failed: {e}");
                }
            }
        })
    }

    fn active(&self, class: JobClass) -> &AtomicUsize {
        match class {
            JobClass::Compositing => &self.active_compositing,
            JobClass::Other => &self.active_other,
        }
    }
}

impl Monitor for SystemMonitor {
    fn job_started(&self, request: &JobRequest) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active(request.class()).fetch_add(1, Ordering::Relaxed);
    }

    fn job_ended(&self, request: &JobRequest) {
        self.ended.fetch_add(1, Ordering::Relaxed);
        let _ = self.active(request.class()).fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |n| n.checked_sub(1),
        );
    }

    fn cpu_load(&self) -> f64 {
        f64::from_bits(self.cpu_load.load(Ordering::Relaxed))
    }
}
