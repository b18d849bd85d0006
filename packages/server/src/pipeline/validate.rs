//! Advisory fabrication detection over generated bodies.
//!
//! Regex-driven scan for claims that tend to be hallucinated: percentages,
//! dollar figures, named social proof, and testimonial-style quotes. Matches
//! not grounded in the verified sender facts are logged, never blocked.
//! This is QA signal, not a gate.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::pipeline::research::CompanyFacts;

lazy_static! {
    static ref PERCENTAGE: Regex = Regex::new(r"\b\d{1,3}(?:\.\d+)?\s?%").unwrap();
    static ref DOLLAR_FIGURE: Regex =
        Regex::new(r"\$\s?\d[\d,]*(?:\.\d+)?\s*(?:[kKmMbB]\b|million|billion)?").unwrap();
    static ref NAMED_PROOF: Regex = Regex::new(
        r"(?i)\b(?:clients?\s+like|companies\s+like|teams\s+like|trusted\s+by|worked\s+with|helped)\s+[A-Z][A-Za-z0-9&]+"
    )
    .unwrap();
    static ref QUOTED_CLAIM: Regex = Regex::new(r#""[^"]{20,}""#).unwrap();
}

/// One suspicious snippet found in a draft body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricationFlag {
    pub kind: FabricationKind,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricationKind {
    Percentage,
    DollarFigure,
    NamedProof,
    QuotedClaim,
}

/// Scan one body against the verified facts. Returns every unverified claim.
pub fn scan_body(body: &str, verified: Option<&CompanyFacts>) -> Vec<FabricationFlag> {
    let corpus = verified.map(verified_corpus).unwrap_or_default();
    let mut flags = Vec::new();

    let checks: [(&Regex, FabricationKind); 4] = [
        (&PERCENTAGE, FabricationKind::Percentage),
        (&DOLLAR_FIGURE, FabricationKind::DollarFigure),
        (&NAMED_PROOF, FabricationKind::NamedProof),
        (&QUOTED_CLAIM, FabricationKind::QuotedClaim),
    ];

    for (regex, kind) in checks {
        for m in regex.find_iter(body) {
            let snippet = m.as_str().trim().to_string();
            if !corpus.contains(&snippet.to_lowercase()) {
                flags.push(FabricationFlag { kind, snippet });
            }
        }
    }

    flags
}

/// Scan and log. The advisory entry point used by the pipeline.
pub fn log_suspicious_content(row_index: u32, body: &str, verified: Option<&CompanyFacts>) {
    for flag in scan_body(body, verified) {
        warn!(
            row_index,
            kind = ?flag.kind,
            snippet = %flag.snippet,
            "draft contains an unverified claim"
        );
    }
}

fn verified_corpus(facts: &CompanyFacts) -> String {
    let mut corpus = String::new();
    for item in facts.case_studies.iter().chain(facts.testimonials.iter()) {
        corpus.push_str(&item.to_lowercase());
        corpus.push('\n');
    }
    corpus
}
