//! Bulk job subsystem: models, store, lifecycle controller, export, driver.

pub mod controller;
pub mod driver;
pub mod export;
pub mod job;
pub mod payload;
pub mod prospect;
pub mod store;
pub mod testing;

pub use controller::{ChunkConfig, CreateJobRequest, JobController};
pub use driver::JobDriver;
pub use job::{ChunkOutcome, Job, JobStatus, JobSummary};
pub use payload::ProspectPayload;
pub use prospect::{ConfidenceTier, EmailDraft, Prospect, ProspectInput, ProspectStatus};
pub use store::{JobStore, PostgresJobStore};
