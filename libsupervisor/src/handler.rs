use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::JobRequest;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::sync::watch;

/// Bookkeeping for one in-flight job. Created once a worker has been
/// spawned and removed only by that worker's supervisor.
pub(crate) struct HandlerRecord {
    pub handler_id: String,
    pub request: Arc<JobRequest>,
    pub worker: WorkerHandle,
    pub done: Completion,
}

/// Signal-capable handle to a spawned worker. The `Child` itself is owned
/// by the supervisor task waiting on it.
#[derive(Debug, Clone)]
pub(crate) struct WorkerHandle {
    pid: Option<u32>,
    reaped: Arc<AtomicBool>,
}

impl WorkerHandle {
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            pid,
            reaped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Called by the supervisor once the worker has been waited on. The pid
    /// may be reused by the OS from then on.
    pub fn mark_reaped(&self) {
        self.reaped.store(true, Ordering::SeqCst);
    }

    pub fn is_reaped(&self) -> bool {
        self.reaped.load(Ordering::SeqCst)
    }

    /// Sends `signal` to the worker. A reaped worker is skipped.
    pub fn signal(&self, signal: Signal) -> Result<(), Errno> {
        if self.is_reaped() {
            return Ok(());
        }
        let pid = self.pid.ok_or(Errno::ESRCH)?;
        let pid = i32::try_from(pid).map_err(|_| Errno::ESRCH)?;
        kill(Pid::from_raw(pid), signal)
    }
}

/// One-shot completion signal of a handler.
///
/// Any number of clones may poll or await it; it flips to done exactly once.
#[derive(Debug, Clone)]
pub struct Completion {
    rx: watch::Receiver<bool>,
}

pub(crate) struct CompletionSender {
    tx: watch::Sender<bool>,
}

pub(crate) fn completion() -> (CompletionSender, Completion) {
    let (tx, rx) = watch::channel(false);
    (CompletionSender { tx }, Completion { rx })
}

impl Completion {
    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the handler has been cleaned up.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // A dropped sender means the supervisor is gone, which is terminal too.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl CompletionSender {
    /// Marks the handler done. Returns false if it was already done.
    pub fn close(&self) -> bool {
        !self.tx.send_replace(true)
    }
}
