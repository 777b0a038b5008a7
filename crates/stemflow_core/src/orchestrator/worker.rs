//! Dedicated worker thread for pipeline jobs.
//!
//! One job runs at a time. The front end submits a `PipelineJob` with an
//! observer and keeps a `JobHandle`; events flow to the observer from the
//! worker thread while the caller stays free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use super::job::{JobOutcome, PipelineJob};
use super::pipeline::CancelHandle;
use crate::models::{JobEvent, JobObserver};

/// Name of the job thread.
const WORKER_THREAD_NAME: &str = "stemflow-job";

/// Errors from submitting or joining a job.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A job is already running.
    #[error("A job is already running")]
    Busy,

    /// The job thread could not be started.
    #[error("Failed to start job thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The job thread panicked before producing an outcome.
    #[error("Job thread panicked")]
    Panicked,
}

/// Runs jobs on a dedicated thread, one at a time.
#[derive(Debug, Default)]
pub struct JobWorker {
    busy: Arc<AtomicBool>,
}

impl JobWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start `job` on the worker thread.
    ///
    /// Rejected with `WorkerError::Busy` while another job is in flight.
    /// The worker is free again by the time the observer sees the
    /// terminal event.
    pub fn submit(
        &self,
        job: PipelineJob,
        observer: Box<dyn JobObserver>,
    ) -> Result<JobHandle, WorkerError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkerError::Busy);
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let busy = Arc::clone(&self.busy);
        let observer: Arc<dyn JobObserver> = Arc::from(observer);
        let forward = move |event: JobEvent| {
            if event.is_terminal() {
                busy.store(false, Ordering::SeqCst);
            }
            observer.on_event(event);
        };

        let cancel = job.cancel_handle();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = guard;
                job.run(Box::new(forward))
            })
            .map_err(WorkerError::Spawn)?;

        tracing::debug!("Job submitted to worker thread");
        Ok(JobHandle { thread, cancel })
    }
}

/// Clears the busy flag when the job thread ends, even by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to a submitted job.
pub struct JobHandle {
    thread: JoinHandle<JobOutcome>,
    cancel: CancelHandle,
}

impl JobHandle {
    /// Ask the job to stop at the next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clone of the job's cancellation handle.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether the job thread has ended.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the job to end.
    pub fn join(self) -> Result<JobOutcome, WorkerError> {
        self.thread.join().map_err(|_| WorkerError::Panicked)
    }
}
