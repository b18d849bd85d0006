//! Error taxonomy for the bulk job subsystem.
//!
//! Failures below the row level are absorbed by the pipeline (fallbacks or a
//! per-row failure marker) and never surface here. `JobError` covers the
//! job-level failures a caller can observe: bad creation input, unknown job
//! id, and persistence faults that abort a chunk call.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the job controller and store.
#[derive(Debug, Error)]
pub enum JobError {
    /// Bad input to job creation. Surfaced verbatim to the caller.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown job identifier.
    #[error("job {0} not found")]
    NotFound(Uuid),

    /// Persistence layer failure. Aborts the current chunk call and leaves
    /// the job in its prior persisted state; safe to retry.
    #[error("store failure: {0}")]
    Store(String),

    /// Draft generation collaborator failure (auth/quota/network or an
    /// empty response). Captured per-row by the pipeline; only reaches this
    /// level during one-time sender enrichment, where it is swallowed.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Research collaborator failure. Always degraded to placeholder facts
    /// by the pipeline.
    #[error("research failed: {0}")]
    Research(String),
}

impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        JobError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for JobError {
    // Malformed persisted payload is a store fault, not silent data loss.
    fn from(err: serde_json::Error) -> Self {
        JobError::Store(format!("payload deserialization failed: {}", err))
    }
}

impl JobError {
    /// Whether this error indicates a missing resource (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, JobError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_id() {
        let id = Uuid::new_v4();
        let err = JobError::NotFound(id);
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn serde_errors_map_to_store() {
        let bad: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: JobError = bad.unwrap_err().into();
        assert!(matches!(err, JobError::Store(_)));
    }
}
