//! Job model for bulk outreach generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::payload::ProspectPayload;
use crate::pipeline::research::CompanyFacts;

/// Upper bound on prospects per job.
pub const MAX_PROSPECTS: usize = 5000;

/// Upper bound on attached free-text context, in characters.
pub const MAX_ATTACHMENT_CHARS: usize = 20_000;

/// Job lifecycle. A monotonic forward state machine; the only transition
/// back to `Pending` is an explicit reset, which also clears row results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses never accept further chunk work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

/// A bulk outreach job: immutable configuration, aggregate counters, and the
/// full prospect payload.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    #[builder(default)]
    pub status: JobStatus,

    // Configuration (immutable after creation; style_id changes only on reset)
    pub sender_url: String,
    pub value_prop: String,
    pub intent: String,
    pub style_id: String,
    #[builder(default, setter(strip_option(fallback = attachment_opt)))]
    pub attachment: Option<String>,

    // One-time sender enrichment, best-effort at creation
    #[builder(default, setter(strip_option(fallback = sender_facts_opt)))]
    pub sender_facts: Option<CompanyFacts>,
    #[builder(default, setter(strip_option(fallback = enriched_value_prop_opt)))]
    pub enriched_value_prop: Option<String>,

    // Aggregate counters; invariant: processed == success + failed <= total
    pub total_prospects: i32,
    #[builder(default = 0)]
    pub processed_count: i32,
    #[builder(default = 0)]
    pub success_count: i32,
    #[builder(default = 0)]
    pub failed_count: i32,

    pub payload: ProspectPayload,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Rows still pending in the payload. Counted from the rows themselves,
    /// not from `total_prospects`, so a drifted declared total cannot report
    /// remaining work on a fully drained job.
    pub fn remaining_count(&self) -> i32 {
        self.payload.pending_count() as i32
    }

    /// The value proposition the pipeline should use: the enriched rewrite
    /// when sender enrichment succeeded, the raw input otherwise.
    pub fn effective_value_prop(&self) -> &str {
        self.enriched_value_prop
            .as_deref()
            .unwrap_or(&self.value_prop)
    }

    /// Counter-only projection for status queries and chunk responses.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            status: self.status,
            style_id: self.style_id.clone(),
            total_prospects: self.total_prospects,
            processed_count: self.processed_count,
            success_count: self.success_count,
            failed_count: self.failed_count,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }

    /// Result shape returned by chunk-processing calls.
    pub fn chunk_outcome(&self) -> ChunkOutcome {
        ChunkOutcome {
            status: self.status,
            processed_count: self.processed_count,
            success_count: self.success_count,
            failed_count: self.failed_count,
            total_prospects: self.total_prospects,
            remaining_count: self.remaining_count(),
            is_complete: self.status.is_terminal(),
        }
    }
}

/// Job metadata and counters, without the row payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: JobStatus,
    pub style_id: String,
    pub total_prospects: i32,
    pub processed_count: i32,
    pub success_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate counters plus completion signal, returned per chunk call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub status: JobStatus,
    pub processed_count: i32,
    pub success_count: i32,
    pub failed_count: i32,
    pub total_prospects: i32,
    pub remaining_count: i32,
    pub is_complete: bool,
}
