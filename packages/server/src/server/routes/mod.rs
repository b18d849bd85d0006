pub mod health;
pub mod jobs;

pub use health::health_handler;
pub use jobs::{
    cancel_job_handler, create_job_handler, export_handler, job_status_handler,
    process_chunk_handler, reset_job_handler,
};
