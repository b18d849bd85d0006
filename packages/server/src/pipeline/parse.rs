//! Tolerant parsing of generation responses into (subject, body) pairs.
//!
//! Models mostly follow the requested `===EMAIL N===` format but drift:
//! extra whitespace, lowercase labels, markdown fences, missing BODY labels.
//! The parser recovers what it can and pads to exactly three drafts; a row
//! with some empty outputs is still a completed row.

use lazy_static::lazy_static;
use regex::Regex;

use crate::jobs::prospect::EmailDraft;
use crate::pipeline::prompt::DRAFTS_PER_PROSPECT;

lazy_static! {
    static ref DELIMITER: Regex = Regex::new(r"(?i)={2,}\s*EMAIL\s*\d+\s*={2,}").unwrap();
    static ref SUBJECT_LINE: Regex = Regex::new(r"(?im)^\s*\**SUBJECT\**\s*:\s*(.*)$").unwrap();
    static ref BODY_LABEL: Regex = Regex::new(r"(?im)^\s*\**BODY\**\s*:\s*").unwrap();
}

/// Parse a free-text response into exactly `DRAFTS_PER_PROSPECT` drafts.
///
/// Never fails: unrecoverable segments become empty placeholder drafts.
pub fn parse_drafts(response: &str) -> Vec<EmailDraft> {
    let cleaned = strip_code_fences(response);

    let mut drafts: Vec<EmailDraft> = DELIMITER
        .split(&cleaned)
        .filter_map(parse_segment)
        .take(DRAFTS_PER_PROSPECT)
        .collect();

    drafts.resize(DRAFTS_PER_PROSPECT, EmailDraft::default());
    drafts
}

/// Parse one delimited segment into a draft, or None if it holds nothing.
fn parse_segment(segment: &str) -> Option<EmailDraft> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    let subject = SUBJECT_LINE
        .captures(segment)
        .map(|c| c[1].trim().trim_matches('"').to_string())
        .unwrap_or_default();

    let body = match BODY_LABEL.find(segment) {
        Some(m) => segment[m.end()..].trim().to_string(),
        None => {
            // No BODY label: take everything after the subject line.
            match SUBJECT_LINE.find(segment) {
                Some(m) => segment[m.end()..].trim().to_string(),
                None => segment.to_string(),
            }
        }
    };

    if subject.is_empty() && body.is_empty() {
        return None;
    }

    Some(EmailDraft { subject, body })
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```markdown", "")
        .replace("```text", "")
        .replace("```", "")
}
