//! Prospect (row) model for bulk jobs.
//!
//! A prospect carries a stable 1-based `index` tied to its source position.
//! All per-row state merges key on this index, never on array position, so
//! results survive reordering and reserialization.

use serde::{Deserialize, Serialize};

/// Per-row lifecycle. Terminal and one-way: `Pending -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Coarse data-quality tier derived once at ingestion from which optional
/// fields are present. Informational only; never blocks processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// One generated email candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_empty() && self.body.is_empty()
    }
}

/// Raw input fields for one prospect, as supplied at job creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProspectInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub title: String,
    pub company: String,
    pub website: String,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// A prospect row inside a job's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    /// Stable 1-based source index. Identity for all merges.
    pub index: u32,

    #[serde(flatten)]
    pub input: ProspectInput,

    pub confidence: ConfidenceTier,

    // Tolerate partially-written legacy payloads: a row with no status
    // deserializes as pending and gets reprocessed.
    #[serde(default)]
    pub status: ProspectStatus,

    #[serde(default)]
    pub drafts: Vec<EmailDraft>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Prospect {
    /// Build a pending prospect from raw input, deriving its confidence tier.
    pub fn from_input(index: u32, input: ProspectInput) -> Self {
        let confidence = derive_confidence(&input);
        Self {
            index,
            input,
            confidence,
            status: ProspectStatus::Pending,
            drafts: Vec::new(),
            error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProspectStatus::Pending
    }

    /// Mark the row completed with its generated drafts.
    pub fn complete(&mut self, drafts: Vec<EmailDraft>) {
        self.status = ProspectStatus::Completed;
        self.drafts = drafts;
        self.error = None;
    }

    /// Mark the row failed with a human-readable error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ProspectStatus::Failed;
        self.drafts = Vec::new();
        self.error = Some(error.into());
    }

    /// Return the row to pending, clearing any outputs and error.
    pub fn clear(&mut self) {
        self.status = ProspectStatus::Pending;
        self.drafts = Vec::new();
        self.error = None;
    }
}

/// Tier from optional-field coverage: title + (linkedin or location) is high,
/// either alone is medium, neither is low.
fn derive_confidence(input: &ProspectInput) -> ConfidenceTier {
    let has_title = !input.title.trim().is_empty();
    let has_optional = input.linkedin.as_deref().map_or(false, |s| !s.trim().is_empty())
        || input.location.as_deref().map_or(false, |s| !s.trim().is_empty());

    match (has_title, has_optional) {
        (true, true) => ConfidenceTier::High,
        (true, false) | (false, true) => ConfidenceTier::Medium,
        (false, false) => ConfidenceTier::Low,
    }
}
