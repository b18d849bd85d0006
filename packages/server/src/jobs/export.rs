//! CSV export of a job's row collection.
//!
//! One data row per prospect: original inputs plus up to three generated
//! (subject, body) columns and the row's status/error. Standard quoting:
//! fields containing the delimiter, quote character, or newline are quoted
//! with embedded quotes doubled.

use super::payload::ProspectPayload;
use super::prospect::{ConfidenceTier, Prospect, ProspectStatus};
use crate::pipeline::prompt::DRAFTS_PER_PROSPECT;

const HEADER: &[&str] = &[
    "index",
    "first_name",
    "last_name",
    "email",
    "title",
    "company",
    "website",
    "linkedin",
    "location",
    "confidence",
    "status",
    "error",
    "subject_1",
    "body_1",
    "subject_2",
    "body_2",
    "subject_3",
    "body_3",
];

/// Render the payload as CSV text, header row included.
pub fn render_csv(payload: &ProspectPayload) -> String {
    let mut out = String::new();
    write_record(&mut out, HEADER.iter().map(|s| s.to_string()));

    for prospect in &payload.prospects {
        write_record(&mut out, prospect_fields(prospect));
    }

    out
}

fn prospect_fields(p: &Prospect) -> impl Iterator<Item = String> {
    let mut fields = vec![
        p.index.to_string(),
        p.input.first_name.clone(),
        p.input.last_name.clone(),
        p.input.email.clone(),
        p.input.title.clone(),
        p.input.company.clone(),
        p.input.website.clone(),
        p.input.linkedin.clone().unwrap_or_default(),
        p.input.location.clone().unwrap_or_default(),
        confidence_label(p.confidence).to_string(),
        status_label(p.status).to_string(),
        p.error.clone().unwrap_or_default(),
    ];

    for i in 0..DRAFTS_PER_PROSPECT {
        match p.drafts.get(i) {
            Some(draft) => {
                fields.push(draft.subject.clone());
                fields.push(draft.body.clone());
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }

    fields.into_iter()
}

fn confidence_label(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => "high",
        ConfidenceTier::Medium => "medium",
        ConfidenceTier::Low => "low",
    }
}

fn status_label(status: ProspectStatus) -> &'static str {
    match status {
        ProspectStatus::Pending => "pending",
        ProspectStatus::Completed => "completed",
        ProspectStatus::Failed => "failed",
    }
}

fn write_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(&field));
    }
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
