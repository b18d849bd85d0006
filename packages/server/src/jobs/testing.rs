//! In-memory job store for tests and local experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::job::{Job, JobStatus, JobSummary};
use super::store::JobStore;
use crate::error::JobError;

/// `JobStore` backed by a `HashMap`. Jobs round-trip through JSON on every
/// read and write so serde behavior matches the Postgres JSONB column.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, String>>,
    fail_next_update: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `update` call fail with a store error. Lets tests
    /// exercise the chunk-abort-and-retry path.
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    fn encode(job: &Job) -> Result<String, JobError> {
        serde_json::to_string(job).map_err(Into::into)
    }

    fn decode(raw: &str) -> Result<Job, JobError> {
        serde_json::from_str(raw).map_err(Into::into)
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: &Job) -> Result<(), JobError> {
        let encoded = Self::encode(job)?;
        self.jobs.write().await.insert(job.id, encoded);
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Job, JobError> {
        let jobs = self.jobs.read().await;
        let raw = jobs.get(&id).ok_or(JobError::NotFound(id))?;
        Self::decode(raw)
    }

    async fn fetch_summary(&self, id: Uuid) -> Result<JobSummary, JobError> {
        Ok(self.fetch(id).await?.summary())
    }

    async fn update(&self, job: &Job) -> Result<(), JobError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(JobError::Store("injected update failure".into()));
        }

        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(&job.id) {
            return Err(JobError::NotFound(job.id));
        }
        jobs.insert(job.id, Self::encode(job)?);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let raw = jobs.get(&id).ok_or(JobError::NotFound(id))?;
        let mut job = Self::decode(raw)?;
        job.status = status;
        jobs.insert(id, Self::encode(&job)?);
        Ok(())
    }
}
