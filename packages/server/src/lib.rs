//! Bulk outreach email generation.
//!
//! The core is the job subsystem in [`jobs`]: a chunked, resumable processor
//! that drives thousands of prospect rows through a research-then-generate
//! pipeline with per-row failure isolation, persisting progress after every
//! chunk so a short-lived invocation can always pick up where the last one
//! stopped.
//!
//! Collaborators sit behind traits:
//! - [`pipeline::research::CompanyResearcher`] for website facts
//! - [`pipeline::generate::DraftGenerator`] for LLM draft text
//!
//! Default implementations are [`scraper::SiteScraper`] and
//! [`pipeline::generate::OpenAiDraftGenerator`].

pub mod config;
pub mod error;
pub mod jobs;
pub mod pipeline;
pub mod scraper;
pub mod server;

pub use config::Config;
pub use error::JobError;
