//! Per-row processing pipeline.
//!
//! Turns one prospect plus job-level context into up to three (subject,
//! body) drafts, or a row-level failure message. Research failure degrades
//! to placeholder facts; only a failed or empty generation call fails the
//! row. Nothing here may panic or propagate past the row boundary; sibling
//! rows in a chunk must be unaffected.

pub mod generate;
pub mod parse;
pub mod prompt;
pub mod research;
pub mod validate;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::jobs::prospect::{EmailDraft, Prospect};
use generate::DraftGenerator;
use prompt::PromptContext;
use research::{placeholder_facts, CompanyResearcher};

/// Outcome of processing one row, keyed by its stable index.
#[derive(Debug)]
pub struct RowOutcome {
    pub index: u32,
    pub result: Result<Vec<EmailDraft>, String>,
}

/// The per-row pipeline: research, prompt, generate, parse, QA scan.
pub struct ProspectPipeline {
    researcher: Arc<dyn CompanyResearcher>,
    generator: Arc<dyn DraftGenerator>,
}

impl ProspectPipeline {
    pub fn new(researcher: Arc<dyn CompanyResearcher>, generator: Arc<dyn DraftGenerator>) -> Self {
        Self {
            researcher,
            generator,
        }
    }

    /// Process one prospect. Every failure mode maps to either a fallback
    /// or an `Err(message)` for this row alone.
    pub async fn process(&self, prospect: &Prospect, ctx: &PromptContext<'_>) -> RowOutcome {
        let index = prospect.index;

        // Step 1: research, falling back to the row's own fields.
        let target_facts = match self.researcher.research(&prospect.input.website).await {
            Ok(facts) => facts,
            Err(e) => {
                debug!(
                    row_index = index,
                    website = %prospect.input.website,
                    error = %e,
                    "research failed; using placeholder facts"
                );
                placeholder_facts(&prospect.input.company, &prospect.input.website)
            }
        };

        // Steps 2-3: prompt and generate. Failure here fails the row.
        let prompt = prompt::build_draft_prompt(prospect, &target_facts, ctx);
        let response = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(row_index = index, error = %e, "draft generation failed");
                return RowOutcome {
                    index,
                    result: Err(format!("draft generation failed: {}", e)),
                };
            }
        };

        if response.trim().is_empty() {
            return RowOutcome {
                index,
                result: Err("draft generation returned an empty response".to_string()),
            };
        }

        // Step 4: tolerant parse, padded to three drafts.
        let drafts = parse::parse_drafts(&response);

        // Step 5: advisory fabrication scan.
        for draft in &drafts {
            if !draft.body.is_empty() {
                validate::log_suspicious_content(index, &draft.body, ctx.sender_facts);
            }
        }

        RowOutcome {
            index,
            result: Ok(drafts),
        }
    }
}
