//! Research collaborator contract.
//!
//! The controller depends only on the shape of the returned facts, not on
//! how they were derived; any extraction method can sit behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Best-effort structured facts about a company, derived from its website.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyFacts {
    pub company_name: String,
    pub description: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub business_type: String,
    #[serde(default)]
    pub raw_excerpt: String,
    /// Verified case studies found on the site. Only these may be cited in
    /// generated drafts.
    #[serde(default)]
    pub case_studies: Vec<String>,
    /// Verified testimonials found on the site.
    #[serde(default)]
    pub testimonials: Vec<String>,
}

impl CompanyFacts {
    /// Whether any verified social proof exists.
    pub fn has_verified_proof(&self) -> bool {
        !self.case_studies.is_empty() || !self.testimonials.is_empty()
    }
}

/// Resolves facts about a company from its website URL.
#[async_trait]
pub trait CompanyResearcher: Send + Sync {
    async fn research(&self, url: &str) -> Result<CompanyFacts, JobError>;
}

/// Minimal fact set built from a row's own fields when research fails.
///
/// The pipeline never aborts a row solely because research failed; drafts
/// fall back to whatever the CSV already told us about the prospect.
pub fn placeholder_facts(company: &str, website: &str) -> CompanyFacts {
    let company_name = if company.trim().is_empty() {
        website.trim().to_string()
    } else {
        company.trim().to_string()
    };

    CompanyFacts {
        description: format!("{} ({})", company_name, website.trim()),
        company_name,
        ..Default::default()
    }
}
