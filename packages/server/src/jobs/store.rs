//! Job store contract and the Postgres implementation.
//!
//! The store is the single source of truth. The controller performs
//! read-modify-write on the full job record: load, mutate in memory, write
//! back in one statement. There is no optimistic concurrency token; last
//! writer wins, which is acceptable only under the documented assumption
//! that one client serializes chunk calls per job.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::job::{Job, JobStatus, JobSummary};
use super::payload::ProspectPayload;
use crate::error::JobError;
use crate::pipeline::research::CompanyFacts;

/// Durable record of bulk jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a newly created job.
    async fn insert(&self, job: &Job) -> Result<(), JobError>;

    /// Load a full job, payload included.
    async fn fetch(&self, id: Uuid) -> Result<Job, JobError>;

    /// Load job metadata and counters without the row payload.
    async fn fetch_summary(&self, id: Uuid) -> Result<JobSummary, JobError>;

    /// Write back all mutable job state (status, style, counters, payload,
    /// completion timestamp) in a single statement.
    async fn update(&self, job: &Job) -> Result<(), JobError>;

    /// Lightweight status-only transition (processing start, cancel).
    async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<(), JobError>;
}

/// Postgres-backed job store.
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    status: JobStatus,
    sender_url: String,
    value_prop: String,
    intent: String,
    style_id: String,
    attachment: Option<String>,
    sender_facts: Option<Json<CompanyFacts>>,
    enriched_value_prop: Option<String>,
    total_prospects: i32,
    processed_count: i32,
    success_count: i32,
    failed_count: i32,
    payload: Json<ProspectPayload>,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            status: row.status,
            sender_url: row.sender_url,
            value_prop: row.value_prop,
            intent: row.intent,
            style_id: row.style_id,
            attachment: row.attachment,
            sender_facts: row.sender_facts.map(|j| j.0),
            enriched_value_prop: row.enriched_value_prop,
            total_prospects: row.total_prospects,
            processed_count: row.processed_count,
            success_count: row.success_count,
            failed_count: row.failed_count,
            payload: row.payload.0,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: Uuid,
    status: JobStatus,
    style_id: String,
    total_prospects: i32,
    processed_count: i32,
    success_count: i32,
    failed_count: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn insert(&self, job: &Job) -> Result<(), JobError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, status, sender_url, value_prop, intent, style_id, attachment,
                sender_facts, enriched_value_prop,
                total_prospects, processed_count, success_count, failed_count,
                payload, created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(job.id)
        .bind(job.status)
        .bind(&job.sender_url)
        .bind(&job.value_prop)
        .bind(&job.intent)
        .bind(&job.style_id)
        .bind(&job.attachment)
        .bind(job.sender_facts.as_ref().map(Json))
        .bind(&job.enriched_value_prop)
        .bind(job.total_prospects)
        .bind(job.processed_count)
        .bind(job.success_count)
        .bind(job.failed_count)
        .bind(Json(&job.payload))
        .bind(job.created_at)
        .bind(job.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Job, JobError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, status, sender_url, value_prop, intent, style_id, attachment,
                   sender_facts, enriched_value_prop,
                   total_prospects, processed_count, success_count, failed_count,
                   payload, created_at, completed_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::from).ok_or(JobError::NotFound(id))
    }

    async fn fetch_summary(&self, id: Uuid) -> Result<JobSummary, JobError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, status, style_id, total_prospects,
                   processed_count, success_count, failed_count,
                   created_at, completed_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(JobError::NotFound(id))?;
        Ok(JobSummary {
            id: row.id,
            status: row.status,
            style_id: row.style_id,
            total_prospects: row.total_prospects,
            processed_count: row.processed_count,
            success_count: row.success_count,
            failed_count: row.failed_count,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }

    async fn update(&self, job: &Job) -> Result<(), JobError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1,
                style_id = $2,
                processed_count = $3,
                success_count = $4,
                failed_count = $5,
                payload = $6,
                completed_at = $7
            WHERE id = $8
            "#,
        )
        .bind(job.status)
        .bind(&job.style_id)
        .bind(job.processed_count)
        .bind(job.success_count)
        .bind(job.failed_count)
        .bind(Json(&job.payload))
        .bind(job.completed_at)
        .bind(job.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(JobError::NotFound(job.id));
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<(), JobError> {
        let result = sqlx::query("UPDATE jobs SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(JobError::NotFound(id));
        }
        Ok(())
    }
}
