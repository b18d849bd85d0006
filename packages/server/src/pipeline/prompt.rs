//! Prompt construction for draft generation and sender enrichment.
//!
//! Prompts enumerate hard constraints explicitly: word-count band, subject
//! length, structural shape, and a prohibition on fabricating claims not
//! present in the verified sender facts.

use crate::jobs::prospect::Prospect;
use crate::pipeline::research::CompanyFacts;

/// Expected number of candidate emails per prospect.
pub const DRAFTS_PER_PROSPECT: usize = 3;

/// Delimiter the model is instructed to emit between candidates.
/// `parse::parse_drafts` splits on this family of markers.
pub const EMAIL_DELIMITER: &str = "===EMAIL";

/// Job-level context shared by every row in a chunk.
pub struct PromptContext<'a> {
    pub sender_facts: Option<&'a CompanyFacts>,
    pub value_prop: &'a str,
    pub intent: &'a str,
    pub style_id: &'a str,
    pub attachment: Option<&'a str>,
}

/// Named style guidance blocks, keyed by style identifier.
fn style_guidance(style_id: &str) -> &'static str {
    match style_id {
        "direct" => "Direct and confident. Lead with the point, no pleasantries.",
        "casual" => "Conversational and warm, like a note to a peer. Contractions welcome.",
        "formal" => "Professional and polished. No slang, complete sentences.",
        "curious" => "Open with a genuine question about their business; sell softly.",
        _ => "Clear, friendly, and professional.",
    }
}

fn format_facts(label: &str, facts: &CompanyFacts) -> String {
    let mut out = format!("{}:\n- Name: {}\n", label, facts.company_name);
    if !facts.description.is_empty() {
        out.push_str(&format!("- Description: {}\n", facts.description));
    }
    if !facts.business_type.is_empty() {
        out.push_str(&format!("- Business type: {}\n", facts.business_type));
    }
    for point in &facts.key_points {
        out.push_str(&format!("- Key point: {}\n", point));
    }
    for study in &facts.case_studies {
        out.push_str(&format!("- Verified case study: {}\n", study));
    }
    for quote in &facts.testimonials {
        out.push_str(&format!("- Verified testimonial: {}\n", quote));
    }
    out
}

/// Build the generation prompt for a single prospect.
pub fn build_draft_prompt(
    prospect: &Prospect,
    target_facts: &CompanyFacts,
    ctx: &PromptContext<'_>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Write {} distinct cold outreach emails to {} {}",
        DRAFTS_PER_PROSPECT, prospect.input.first_name, prospect.input.last_name
    ));
    if !prospect.input.title.trim().is_empty() {
        prompt.push_str(&format!(", {}", prospect.input.title));
    }
    prompt.push_str(&format!(" at {}.\n\n", prospect.input.company));

    prompt.push_str(&format_facts("ABOUT THE RECIPIENT'S COMPANY", target_facts));
    prompt.push('\n');

    if let Some(facts) = ctx.sender_facts {
        prompt.push_str(&format_facts("ABOUT THE SENDER", facts));
        prompt.push('\n');
    }

    prompt.push_str(&format!("SENDER VALUE PROPOSITION: {}\n", ctx.value_prop));
    prompt.push_str(&format!("OUTREACH GOAL: {}\n", ctx.intent));
    prompt.push_str(&format!("STYLE: {}\n", style_guidance(ctx.style_id)));

    if let Some(attachment) = ctx.attachment {
        if !attachment.trim().is_empty() {
            prompt.push_str(&format!("\nADDITIONAL CONTEXT:\n{}\n", attachment));
        }
    }

    let proof_rule = match ctx.sender_facts {
        Some(facts) if facts.has_verified_proof() => {
            "- You may reference ONLY the verified case studies and testimonials listed above."
        }
        _ => "- Do NOT mention any case studies, testimonials, client names, statistics, percentages, or dollar figures. None are verified.",
    };

    prompt.push_str(&format!(
        r#"
HARD CONSTRAINTS:
- Each email body must be 60 to 120 words.
- Each subject line must be at most 50 characters.
- Structure: one-line personalized opener, one or two sentences of value, a single clear call to action.
- Never invent facts about either company.
{proof_rule}

OUTPUT FORMAT (exactly, no extra commentary):
===EMAIL 1===
SUBJECT: <subject line>
BODY:
<body>
===EMAIL 2===
SUBJECT: <subject line>
BODY:
<body>
===EMAIL 3===
SUBJECT: <subject line>
BODY:
<body>
"#
    ));

    prompt
}

/// Build the one-time prompt that rewrites a raw value proposition into an
/// outcome-oriented statement, using the sender's own site facts.
pub fn build_enrichment_prompt(raw_value_prop: &str, sender_facts: &CompanyFacts) -> String {
    format!(
        "{}\nRewrite the following value proposition as one concise, \
         outcome-oriented sentence a prospect would care about. Output only \
         the rewritten sentence.\n\nVALUE PROPOSITION: {}",
        format_facts("ABOUT THE SENDER", sender_facts),
        raw_value_prop
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::prospect::ProspectInput;

    fn prospect() -> Prospect {
        Prospect::from_input(
            1,
            ProspectInput {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                title: "VP Engineering".into(),
                company: "Navy Systems".into(),
                website: "navy.example.com".into(),
                ..Default::default()
            },
        )
    }

    fn ctx(sender_facts: Option<&CompanyFacts>) -> PromptContext<'_> {
        PromptContext {
            sender_facts,
            value_prop: "we cut deploy times",
            intent: "book a 15-minute call",
            style_id: "direct",
            attachment: None,
        }
    }

    #[test]
    fn prompt_includes_recipient_and_constraints() {
        let facts = CompanyFacts {
            company_name: "Navy Systems".into(),
            description: "Defense software".into(),
            ..Default::default()
        };
        let prompt = build_draft_prompt(&prospect(), &facts, &ctx(None));
        assert!(prompt.contains("Grace Hopper"));
        assert!(prompt.contains("VP Engineering"));
        assert!(prompt.contains("HARD CONSTRAINTS"));
        assert!(prompt.contains("===EMAIL 3==="));
    }

    #[test]
    fn unverified_proof_is_prohibited() {
        let facts = CompanyFacts::default();
        let prompt = build_draft_prompt(&prospect(), &facts, &ctx(None));
        assert!(prompt.contains("Do NOT mention any case studies"));
    }

    #[test]
    fn verified_proof_is_allowed_when_present() {
        let sender = CompanyFacts {
            company_name: "Us Inc".into(),
            case_studies: vec!["Helped Acme ship 2x faster".into()],
            ..Default::default()
        };
        let prompt = build_draft_prompt(&prospect(), &CompanyFacts::default(), &ctx(Some(&sender)));
        assert!(prompt.contains("ONLY the verified case studies"));
        assert!(prompt.contains("Helped Acme ship 2x faster"));
    }

    #[test]
    fn unknown_style_gets_default_guidance() {
        assert_eq!(style_guidance("nope"), "Clear, friendly, and professional.");
    }
}
