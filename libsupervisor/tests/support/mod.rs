use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{
    EncodedFileOutput, FileType, HandlerConfig, JobKind, JobRequest, Output,
    RoomCompositeRequest, ServiceConfig, TrackRequest,
};
use libsupervisor::{Monitor, ProcessManager};
use tokio::time::{sleep, timeout};

pub const WAIT: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct CountingMonitor {
    pub started: AtomicUsize,
    pub ended: AtomicUsize,
}

#[allow(dead_code)]
impl CountingMonitor {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }
}

impl Monitor for CountingMonitor {
    fn job_started(&self, _request: &JobRequest) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn job_ended(&self, _request: &JobRequest) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }

    fn cpu_load(&self) -> f64 {
        0.25
    }
}

/// A manager whose workers run `script` under `/bin/sh`. Inside the script
/// `$1` is `run-handler`, `$3` the config payload and `$5` the request payload.
pub fn manager_with_script(script: &str) -> (ProcessManager, Arc<CountingMonitor>) {
    manager_with_handler(HandlerConfig {
        program: "/bin/sh".to_string(),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            "rkw-worker".to_string(),
        ],
    })
}

#[allow(dead_code)]
pub fn manager_with_handler(handler: HandlerConfig) -> (ProcessManager, Arc<CountingMonitor>) {
    let monitor = Arc::new(CountingMonitor::default());
    let conf = ServiceConfig {
        handler,
        ..Default::default()
    };
    (ProcessManager::new(conf, monitor.clone()), monitor)
}

pub fn composite_request(job_id: &str) -> JobRequest {
    JobRequest {
        job_id: job_id.to_string(),
        room_id: "RM_test".to_string(),
        token: "token".to_string(),
        ws_url: "ws://localhost:7880".to_string(),
        request: JobKind::RoomComposite(RoomCompositeRequest {
            room_name: "test-room".to_string(),
            layout: "speaker-dark".to_string(),
            output: Output::File(EncodedFileOutput {
                file_type: FileType::Mp4,
                filepath: "r_{room_name}_{time}.mp4".to_string(),
            }),
            ..Default::default()
        }),
    }
}

pub fn track_request(job_id: &str) -> JobRequest {
    JobRequest {
        job_id: job_id.to_string(),
        room_id: "RM_test".to_string(),
        token: "token".to_string(),
        ws_url: "ws://localhost:7880".to_string(),
        request: JobKind::Track(TrackRequest {
            room_name: "test-room".to_string(),
            track_id: "TR_audio".to_string(),
            output: Output::File(EncodedFileOutput {
                file_type: FileType::Ogg,
                filepath: "t_{track_id}.ogg".to_string(),
            }),
        }),
    }
}

/// Waits for a registered job's completion signal.
#[allow(dead_code)]
pub async fn wait_done(manager: &ProcessManager, job_id: &str) {
    let done = manager
        .completion(job_id)
        .await
        .unwrap_or_else(|| panic!("job {job_id} is not registered"));
    timeout(WAIT, done.wait())
        .await
        .unwrap_or_else(|_| panic!("job {job_id} did not finish"));
    assert!(done.is_done());
}

#[allow(dead_code)]
pub async fn await_idle(manager: &ProcessManager) {
    timeout(WAIT, async {
        while !manager.is_idle().await {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("manager did not become idle");
}
