//! Dedicated compute thread.
//!
//! Computes are CPU-bound and can run for a long time, so they go to a single
//! named OS thread fed through a bounded channel instead of the async
//! runtime. Callers await the result through a oneshot.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::ApiError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pending jobs beyond the running one.
const QUEUE_DEPTH: usize = 4;

pub struct ComputeWorker {
    jobs: mpsc::Sender<Job>,
}

impl ComputeWorker {
    /// Spawns the worker thread. It exits once the worker is dropped.
    pub fn start() -> Result<Self, ApiError> {
        let (jobs, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
        std::thread::Builder::new()
            .name("ransim-compute".to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    job();
                }
                debug!("compute worker stopped");
            })
            .map_err(|e| ApiError::InternalError(format!("failed to start compute worker: {}", e)))?;
        Ok(ComputeWorker { jobs })
    }

    /// Runs `f` on the worker thread and waits for its result.
    pub async fn submit<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = Uuid::new_v4();
        let (done, result) = oneshot::channel();
        let job: Job = Box::new(move || {
            debug!(job = %id, "compute job started");
            match catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    let _ = done.send(value);
                }
                Err(_) => error!(job = %id, "compute job panicked"),
            }
        });
        self.jobs
            .send(job)
            .await
            .map_err(|_| ApiError::InternalError("compute worker is not running".to_string()))?;
        result
            .await
            .map_err(|_| ApiError::InternalError(format!("compute job {} did not finish", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_jobs_off_the_runtime_thread() {
        let worker = ComputeWorker::start().unwrap();
        let name = worker
            .submit(|| std::thread::current().name().map(str::to_string))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("ransim-compute"));
    }

    #[tokio::test]
    async fn panicking_job_reports_error_and_worker_survives() {
        let worker = ComputeWorker::start().unwrap();
        let err = worker.submit(|| -> u32 { panic!("boom") }).await;
        assert!(matches!(err, Err(ApiError::InternalError(_))));
        assert_eq!(worker.submit(|| 2 + 2).await.unwrap(), 4);
    }
}
