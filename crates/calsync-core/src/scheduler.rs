//! Debounced, serialized job runner.
//!
//! A single worker thread owns the job. `request()` only sends on a channel,
//! so it never blocks and may be called from any thread. The worker waits for
//! a quiet period of `delay` after the latest request before running the job;
//! every request received during that window restarts the timer. Requests
//! that arrive while the job is running are picked up afterwards and coalesce
//! into one more run; their quiet period starts when the run ends, not when
//! they were sent.
//!
//! ```text
//! request x N ──> [quiet period, re-armed per request] ──> job ──> idle
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::CoreError;

const WORKER_NAME: &str = "calendar-sync";

type Job = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Request,
    Shutdown,
}

/// Runs a job on a dedicated thread, at most once per quiet period.
pub struct Debouncer {
    tx: UnboundedSender<Command>,
    worker: Option<thread::JoinHandle<()>>,
    runs: Arc<AtomicU64>,
}

impl Debouncer {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker's timer runtime or thread cannot be
    /// created.
    pub fn start<F>(delay: Duration, job: F) -> Result<Self, CoreError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let runs = Arc::new(AtomicU64::new(0));

        let job: Job = Arc::new(job);
        let worker_runs = Arc::clone(&runs);
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || runtime.block_on(run_worker(rx, delay, job, worker_runs)))?;

        Ok(Self {
            tx,
            worker: Some(worker),
            runs,
        })
    }

    /// Cancel any pending run and schedule a new one after the quiet period.
    pub fn request(&self) {
        if self.tx.send(Command::Request).is_err() {
            tracing::warn!("sync worker has stopped; request dropped");
        }
    }

    /// Number of job runs completed so far (including ones that panicked).
    pub fn completed_runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    /// Stop the worker. A pending run is executed first; a running job is
    /// waited for.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.tx.send(Command::Shutdown);
        if worker.join().is_err() {
            tracing::error!("sync worker thread panicked");
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_worker(
    mut rx: UnboundedReceiver<Command>,
    delay: Duration,
    job: Job,
    runs: Arc<AtomicU64>,
) {
    while let Some(Command::Request) = rx.recv().await {
        let shutting_down = quiet_period(&mut rx, delay).await;
        run_guarded(&job);
        runs.fetch_add(1, Ordering::SeqCst);
        if shutting_down {
            break;
        }
    }
    tracing::debug!("sync worker stopped");
}

/// Wait until `delay` elapses without another request. Returns true when
/// shutdown was requested (or every sender dropped) during the wait.
async fn quiet_period(rx: &mut UnboundedReceiver<Command>, delay: Duration) -> bool {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => return false,
            cmd = rx.recv() => match cmd {
                Some(Command::Request) => continue,
                Some(Command::Shutdown) | None => return true,
            },
        }
    }
}

fn run_guarded(job: &Job) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| job())) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%message, "sync pass panicked");
    }
}
