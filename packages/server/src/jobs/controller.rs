//! Job lifecycle controller.
//!
//! Owns job state transitions, chunk selection, per-row dispatch, and
//! completion detection. A single invocation of `process_next_chunk` is a
//! self-contained unit of work bounded by `chunk_size`; the client drives
//! the job to completion by calling it repeatedly. Correctness never depends
//! on one invocation finishing the whole row set.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::job::{
    ChunkOutcome, Job, JobStatus, JobSummary, MAX_ATTACHMENT_CHARS, MAX_PROSPECTS,
};
use super::payload::ProspectPayload;
use super::prospect::{Prospect, ProspectInput};
use super::store::JobStore;
use crate::error::JobError;
use crate::pipeline::generate::DraftGenerator;
use crate::pipeline::prompt::{self, PromptContext};
use crate::pipeline::research::CompanyResearcher;
use crate::pipeline::{ProspectPipeline, RowOutcome};

/// Tunables for chunked processing.
///
/// `chunk_size` bounds per-invocation wall-clock time against the hosting
/// environment's execution ceiling; `sub_batch` bounds concurrent
/// collaborator calls within a chunk.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub sub_batch: usize,
    pub max_prospects: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            sub_batch: 5,
            max_prospects: MAX_PROSPECTS,
        }
    }
}

/// Inputs to `create_job`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateJobRequest {
    pub sender_url: String,
    pub value_prop: String,
    pub intent: String,
    pub style_id: String,
    #[serde(default)]
    pub attachment: Option<String>,
    pub prospects: Vec<ProspectInput>,
}

/// The core controller. Collaborators and the store are injected; the
/// controller holds no global state.
pub struct JobController {
    store: Arc<dyn JobStore>,
    researcher: Arc<dyn CompanyResearcher>,
    generator: Arc<dyn DraftGenerator>,
    pipeline: ProspectPipeline,
    config: ChunkConfig,
}

impl JobController {
    pub fn new(
        store: Arc<dyn JobStore>,
        researcher: Arc<dyn CompanyResearcher>,
        generator: Arc<dyn DraftGenerator>,
    ) -> Self {
        Self::with_config(store, researcher, generator, ChunkConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn JobStore>,
        researcher: Arc<dyn CompanyResearcher>,
        generator: Arc<dyn DraftGenerator>,
        config: ChunkConfig,
    ) -> Self {
        let pipeline = ProspectPipeline::new(researcher.clone(), generator.clone());
        Self {
            store,
            researcher,
            generator,
            pipeline,
            config,
        }
    }

    /// Validate inputs, derive row confidence, attempt one-time sender
    /// enrichment, and persist a new pending job. Returns the job id.
    #[instrument(skip(self, request), fields(prospects = request.prospects.len()))]
    pub async fn create_job(&self, request: CreateJobRequest) -> Result<Uuid, JobError> {
        self.validate(&request)?;

        let prospects: Vec<Prospect> = request
            .prospects
            .into_iter()
            .enumerate()
            .map(|(i, input)| Prospect::from_input(i as u32 + 1, input))
            .collect();
        let total = prospects.len() as i32;

        // Best-effort, once per job: resolve the sender's own site facts and
        // rewrite the value prop. Failure falls back to the raw inputs and
        // never fails job creation.
        let (sender_facts, enriched_value_prop) =
            self.enrich_sender(&request.sender_url, &request.value_prop).await;

        let job = Job::builder()
            .sender_url(request.sender_url)
            .value_prop(request.value_prop)
            .intent(request.intent)
            .style_id(request.style_id)
            .total_prospects(total)
            .payload(ProspectPayload::new(prospects))
            .attachment_opt(request.attachment)
            .sender_facts_opt(sender_facts)
            .enriched_value_prop_opt(enriched_value_prop)
            .build();

        self.store.insert(&job).await?;
        info!(job_id = %job.id, total_prospects = total, "job created");
        Ok(job.id)
    }

    /// Process one bounded chunk of pending rows. Re-entrant and safe to
    /// call repeatedly: terminal jobs return their counters untouched, and
    /// already-processed rows are excluded from selection.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn process_next_chunk(&self, job_id: Uuid) -> Result<ChunkOutcome, JobError> {
        let mut job = self.store.fetch(job_id).await?;

        // Terminal no-op: report counters, do no work.
        if job.status.is_terminal() {
            return Ok(job.chunk_outcome());
        }

        job.payload.check_integrity(job.id, job.total_prospects);

        if job.status == JobStatus::Pending {
            self.store
                .update_status(job.id, JobStatus::Processing)
                .await?;
            job.status = JobStatus::Processing;
        }

        let pending = job.payload.pending_indices();
        if pending.is_empty() {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            self.store.update(&job).await?;
            info!(job_id = %job.id, "job complete (no pending rows)");
            return Ok(job.chunk_outcome());
        }

        let chunk: Vec<u32> = pending.into_iter().take(self.config.chunk_size).collect();
        info!(
            job_id = %job.id,
            chunk_rows = chunk.len(),
            processed = job.processed_count,
            total = job.total_prospects,
            "processing chunk"
        );

        let outcomes = self.run_chunk(&job, &chunk).await;

        // Merge by stable index; one row's failure never touches siblings.
        for outcome in outcomes {
            let Some(row) = job.payload.get_mut(outcome.index) else {
                warn!(job_id = %job.id, row_index = outcome.index, "outcome for unknown row index");
                continue;
            };
            match outcome.result {
                Ok(drafts) => {
                    row.complete(drafts);
                    job.success_count += 1;
                }
                Err(message) => {
                    row.fail(message);
                    job.failed_count += 1;
                }
            }
            job.processed_count += 1;
        }

        let remaining = job.payload.pending_count();
        if remaining == 0 {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
        }

        // Single write: payload, counters, status, completion timestamp.
        self.store.update(&job).await?;

        info!(
            job_id = %job.id,
            processed = job.processed_count,
            succeeded = job.success_count,
            failed = job.failed_count,
            remaining,
            "chunk persisted"
        );

        Ok(job.chunk_outcome())
    }

    /// Counter-only projection; no row payload.
    pub async fn get_status(&self, job_id: Uuid) -> Result<JobSummary, JobError> {
        self.store.fetch_summary(job_id).await
    }

    /// Return every row to pending and zero all progress so the job can be
    /// regenerated under a different style without re-uploading rows.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn reset(&self, job_id: Uuid, new_style_id: &str) -> Result<JobSummary, JobError> {
        if new_style_id.trim().is_empty() {
            return Err(JobError::Validation("style_id must not be empty".into()));
        }

        let mut job = self.store.fetch(job_id).await?;
        for row in &mut job.payload.prospects {
            row.clear();
        }
        job.processed_count = 0;
        job.success_count = 0;
        job.failed_count = 0;
        job.completed_at = None;
        job.status = JobStatus::Pending;
        job.style_id = new_style_id.to_string();

        self.store.update(&job).await?;
        info!(job_id = %job.id, style_id = %new_style_id, "job reset");
        Ok(job.summary())
    }

    /// Administrative override: mark a non-terminal job cancelled. Does not
    /// interrupt in-flight row processing.
    pub async fn cancel(&self, job_id: Uuid) -> Result<JobSummary, JobError> {
        let summary = self.store.fetch_summary(job_id).await?;
        if summary.status.is_terminal() {
            return Ok(summary);
        }
        self.store
            .update_status(job_id, JobStatus::Cancelled)
            .await?;
        info!(job_id = %job_id, "job cancelled");
        self.store.fetch_summary(job_id).await
    }

    /// Render the row collection as CSV. Read-only; partial exports allowed.
    pub async fn export_results(&self, job_id: Uuid) -> Result<String, JobError> {
        let job = self.store.fetch(job_id).await?;
        Ok(super::export::render_csv(&job.payload))
    }

    fn validate(&self, request: &CreateJobRequest) -> Result<(), JobError> {
        let required = [
            ("sender_url", &request.sender_url),
            ("value_prop", &request.value_prop),
            ("intent", &request.intent),
            ("style_id", &request.style_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(JobError::Validation(format!("{} must not be empty", name)));
            }
        }

        if request.prospects.is_empty() {
            return Err(JobError::Validation("prospect list must not be empty".into()));
        }
        if request.prospects.len() > self.config.max_prospects {
            return Err(JobError::Validation(format!(
                "prospect list exceeds the maximum of {} rows",
                self.config.max_prospects
            )));
        }
        if let Some(attachment) = &request.attachment {
            if attachment.chars().count() > MAX_ATTACHMENT_CHARS {
                return Err(JobError::Validation(format!(
                    "attachment exceeds {} characters",
                    MAX_ATTACHMENT_CHARS
                )));
            }
        }
        Ok(())
    }

    /// One-time sender enrichment. Any failure leaves both outputs None.
    async fn enrich_sender(
        &self,
        sender_url: &str,
        value_prop: &str,
    ) -> (Option<crate::pipeline::research::CompanyFacts>, Option<String>) {
        let facts = match self.researcher.research(sender_url).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(sender_url = %sender_url, error = %e, "sender research failed; using raw inputs");
                return (None, None);
            }
        };

        let enrichment_prompt = prompt::build_enrichment_prompt(value_prop, &facts);
        let rewrite = match self.generator.generate(&enrichment_prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "value prop rewrite failed; keeping original");
                None
            }
        };

        (Some(facts), rewrite)
    }

    /// Fan a chunk out in bounded sub-batches. Outcomes arrive in any order;
    /// each is keyed by stable row index.
    async fn run_chunk(&self, job: &Job, chunk: &[u32]) -> Vec<RowOutcome> {
        let ctx = PromptContext {
            sender_facts: job.sender_facts.as_ref(),
            value_prop: job.effective_value_prop(),
            intent: &job.intent,
            style_id: &job.style_id,
            attachment: job.attachment.as_deref(),
        };

        let mut outcomes = Vec::with_capacity(chunk.len());
        for sub_batch in chunk.chunks(self.config.sub_batch) {
            let futures: Vec<_> = sub_batch
                .iter()
                .filter_map(|index| job.payload.get(*index))
                .map(|prospect| self.pipeline.process(prospect, &ctx))
                .collect();
            outcomes.extend(join_all(futures).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_config_defaults() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.sub_batch, 5);
        assert_eq!(config.max_prospects, MAX_PROSPECTS);
    }
}
