//! In-process progress driver.
//!
//! Serializes `process_next_chunk` calls for a job: invoke the next chunk
//! only after the previous call returns. Overlapping chunk calls for the
//! same job can double-count rows, so the driver holds an in-flight guard
//! per run. For driving a remote server over HTTP, see the `drive_job`
//! binary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::controller::JobController;
use super::job::ChunkOutcome;
use crate::error::JobError;

pub struct JobDriver {
    controller: Arc<JobController>,
    in_flight: AtomicBool,
}

impl JobDriver {
    pub fn new(controller: Arc<JobController>) -> Self {
        Self {
            controller,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Drive a job to completion with strictly serial chunk calls.
    ///
    /// Returns the terminal outcome, or an error if a chunk call failed
    /// (the job stays resumable; calling again picks up where it left off).
    pub async fn run_to_completion(&self, job_id: Uuid) -> Result<ChunkOutcome, JobError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(JobError::Validation(
                "a drive loop is already in flight for this driver".into(),
            ));
        }

        let result = self.drive(job_id).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn drive(&self, job_id: Uuid) -> Result<ChunkOutcome, JobError> {
        let mut rounds = 0u32;
        loop {
            let outcome = self.controller.process_next_chunk(job_id).await?;
            rounds += 1;
            info!(
                job_id = %job_id,
                rounds,
                processed = outcome.processed_count,
                remaining = outcome.remaining_count,
                "drive round complete"
            );
            if outcome.is_complete {
                return Ok(outcome);
            }
        }
    }
}
