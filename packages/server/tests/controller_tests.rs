//! Integration tests for the job lifecycle controller, driven against the
//! in-memory store with scripted collaborators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use outreach_core::error::JobError;
use outreach_core::jobs::testing::InMemoryJobStore;
use outreach_core::jobs::{
    ChunkConfig, CreateJobRequest, JobController, JobDriver, JobStatus, JobStore, ProspectInput,
    ProspectStatus,
};
use outreach_core::pipeline::generate::DraftGenerator;
use outreach_core::pipeline::research::{CompanyFacts, CompanyResearcher};

/// Researcher that fails for any URL containing "unreachable".
struct ScriptedResearcher {
    calls: AtomicU32,
}

impl ScriptedResearcher {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CompanyResearcher for ScriptedResearcher {
    async fn research(&self, url: &str) -> Result<CompanyFacts, JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("unreachable") {
            return Err(JobError::Research(format!("connect error for {url}")));
        }
        Ok(CompanyFacts {
            company_name: format!("Facts for {url}"),
            description: "A fine company".into(),
            ..Default::default()
        })
    }
}

/// Generator that fails for prompts mentioning "Failing Industries" and
/// otherwise emits three well-formed drafts addressed to the prospect.
struct ScriptedGenerator {
    draft_calls: AtomicU32,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            draft_calls: AtomicU32::new(0),
        }
    }

    fn name_from_prompt(prompt: &str) -> String {
        let rest = prompt.split("emails to ").nth(1).unwrap_or("");
        rest.split(" at ")
            .next()
            .unwrap_or("")
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

#[async_trait]
impl DraftGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, JobError> {
        // Enrichment prompts have no hard-constraint block.
        if !prompt.contains("HARD CONSTRAINTS") {
            return Ok("Rewritten value prop.".to_string());
        }
        self.draft_calls.fetch_add(1, Ordering::SeqCst);

        if prompt.contains("Failing Industries") {
            return Err(JobError::Generation("quota exceeded".into()));
        }

        let name = Self::name_from_prompt(prompt);
        Ok((1..=3)
            .map(|i| format!("===EMAIL {i}===\nSUBJECT: For {name} #{i}\nBODY:\nHello {name}, idea number {i}."))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

struct Harness {
    store: Arc<InMemoryJobStore>,
    researcher: Arc<ScriptedResearcher>,
    generator: Arc<ScriptedGenerator>,
    controller: Arc<JobController>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryJobStore::new());
    let researcher = Arc::new(ScriptedResearcher::new());
    let generator = Arc::new(ScriptedGenerator::new());
    let controller = Arc::new(JobController::with_config(
        store.clone(),
        researcher.clone(),
        generator.clone(),
        ChunkConfig {
            chunk_size: 10,
            sub_batch: 5,
            max_prospects: 5000,
        },
    ));
    Harness {
        store,
        researcher,
        generator,
        controller,
    }
}

fn prospect(i: u32) -> ProspectInput {
    ProspectInput {
        first_name: format!("First{i}"),
        last_name: format!("Last{i}"),
        email: format!("p{i}@example.com"),
        title: "CEO".into(),
        company: format!("Company {i}"),
        website: format!("company{i}.example.com"),
        linkedin: None,
        location: None,
    }
}

fn request(n: u32) -> CreateJobRequest {
    CreateJobRequest {
        sender_url: "https://sender.example.com".into(),
        value_prop: "we automate the boring parts".into(),
        intent: "book a 15-minute call".into(),
        style_id: "direct".into(),
        attachment: None,
        prospects: (1..=n).map(prospect).collect(),
    }
}

#[tokio::test]
async fn twenty_five_rows_complete_in_three_chunks_then_noop() {
    let h = harness();
    let job_id = h.controller.create_job(request(25)).await.unwrap();

    let first = h.controller.process_next_chunk(job_id).await.unwrap();
    assert_eq!(first.processed_count, 10);
    assert_eq!(first.remaining_count, 15);
    assert!(!first.is_complete);
    assert_eq!(first.status, JobStatus::Processing);

    let second = h.controller.process_next_chunk(job_id).await.unwrap();
    assert_eq!(second.processed_count, 20);
    assert_eq!(second.remaining_count, 5);
    assert!(!second.is_complete);

    let third = h.controller.process_next_chunk(job_id).await.unwrap();
    assert_eq!(third.processed_count, 25);
    assert_eq!(third.remaining_count, 0);
    assert!(third.is_complete);
    assert_eq!(third.status, JobStatus::Completed);

    // Terminal no-op: same counters, no extra collaborator calls.
    let calls_before = h.generator.draft_calls.load(Ordering::SeqCst);
    let fourth = h.controller.process_next_chunk(job_id).await.unwrap();
    assert_eq!(fourth.processed_count, 25);
    assert!(fourth.is_complete);
    assert_eq!(h.generator.draft_calls.load(Ordering::SeqCst), calls_before);

    let summary = h.controller.get_status(job_id).await.unwrap();
    assert!(summary.completed_at.is_some());
}

#[tokio::test]
async fn row_failures_are_isolated_from_siblings() {
    let h = harness();
    let mut req = request(10);
    // Rows 3 and 7 trigger generation failure.
    req.prospects[2].company = "Failing Industries".into();
    req.prospects[6].company = "Failing Industries".into();

    let job_id = h.controller.create_job(req).await.unwrap();
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();

    assert_eq!(outcome.processed_count, 10);
    assert_eq!(outcome.success_count, 8);
    assert_eq!(outcome.failed_count, 2);
    assert!(outcome.is_complete);

    let job = h.store.fetch(job_id).await.unwrap();
    let failed: Vec<u32> = job
        .payload
        .prospects
        .iter()
        .filter(|p| p.status == ProspectStatus::Failed)
        .map(|p| p.index)
        .collect();
    assert_eq!(failed, vec![3, 7]);
    for p in &job.payload.prospects {
        match p.status {
            ProspectStatus::Failed => {
                assert!(p.error.as_deref().unwrap().contains("quota exceeded"));
                assert!(p.drafts.is_empty());
            }
            ProspectStatus::Completed => {
                assert_eq!(p.drafts.len(), 3);
                assert!(p.error.is_none());
            }
            ProspectStatus::Pending => panic!("no row should remain pending"),
        }
    }
}

#[tokio::test]
async fn counter_invariant_holds_after_every_chunk() {
    let h = harness();
    let mut req = request(12);
    req.prospects[0].company = "Failing Industries".into();
    let job_id = h.controller.create_job(req).await.unwrap();

    loop {
        let outcome = h.controller.process_next_chunk(job_id).await.unwrap();
        assert_eq!(
            outcome.processed_count,
            outcome.success_count + outcome.failed_count
        );
        assert!(outcome.processed_count <= outcome.total_prospects);
        if outcome.is_complete {
            break;
        }
    }
}

#[tokio::test]
async fn outputs_merge_by_stable_index_never_cross_rows() {
    let h = harness();
    let job_id = h.controller.create_job(request(8)).await.unwrap();
    h.controller.process_next_chunk(job_id).await.unwrap();

    let job = h.store.fetch(job_id).await.unwrap();
    for p in &job.payload.prospects {
        let expected = format!("First{0} Last{0}", p.index);
        assert_eq!(p.input.first_name, format!("First{}", p.index));
        for draft in &p.drafts {
            assert!(
                draft.subject.contains(&format!("For {expected}")),
                "row {} got subject {:?}",
                p.index,
                draft.subject
            );
        }
    }
}

#[tokio::test]
async fn unreachable_website_still_completes_via_placeholder_facts() {
    let h = harness();
    let mut req = request(3);
    req.prospects[1].website = "unreachable.example.com".into();

    let job_id = h.controller.create_job(req).await.unwrap();
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();

    assert_eq!(outcome.success_count, 3);
    assert_eq!(outcome.failed_count, 0);

    let job = h.store.fetch(job_id).await.unwrap();
    assert_eq!(job.payload.get(2).unwrap().status, ProspectStatus::Completed);
}

#[tokio::test]
async fn reset_returns_all_rows_to_pending_and_zeroes_counters() {
    let h = harness();
    let job_id = h.controller.create_job(request(5)).await.unwrap();
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();
    assert!(outcome.is_complete);

    let summary = h.controller.reset(job_id, "casual").await.unwrap();
    assert_eq!(summary.status, JobStatus::Pending);
    assert_eq!(summary.style_id, "casual");
    assert_eq!(summary.processed_count, 0);
    assert_eq!(summary.success_count, 0);
    assert_eq!(summary.failed_count, 0);
    assert!(summary.completed_at.is_none());

    let job = h.store.fetch(job_id).await.unwrap();
    for p in &job.payload.prospects {
        assert_eq!(p.status, ProspectStatus::Pending);
        assert!(p.drafts.is_empty());
        assert!(p.error.is_none());
    }

    // The job is processable again under the new style.
    let rerun = h.controller.process_next_chunk(job_id).await.unwrap();
    assert!(rerun.is_complete);
    assert_eq!(rerun.success_count, 5);
}

#[tokio::test]
async fn export_has_a_data_row_per_prospect_with_outputs() {
    let h = harness();
    let job_id = h.controller.create_job(request(4)).await.unwrap();
    h.controller.process_next_chunk(job_id).await.unwrap();

    let csv = h.controller.export_results(job_id).await.unwrap();
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 5, "header plus four data rows");
    for i in 1..=4 {
        let line = lines[i];
        assert!(line.starts_with(&format!("{i},")));
        assert!(line.contains("completed"));
        assert!(line.contains(&format!("For First{i} Last{i} #3")));
    }
}

#[tokio::test]
async fn partial_export_is_allowed_mid_job() {
    let h = harness();
    let job_id = h.controller.create_job(request(15)).await.unwrap();
    h.controller.process_next_chunk(job_id).await.unwrap();

    let csv = h.controller.export_results(job_id).await.unwrap();
    assert!(csv.contains("pending"));
    assert!(csv.contains("completed"));
}

#[tokio::test]
async fn store_failure_aborts_chunk_and_is_retryable() {
    let h = harness();
    let job_id = h.controller.create_job(request(5)).await.unwrap();

    h.store.fail_next_update();
    let err = h.controller.process_next_chunk(job_id).await.unwrap_err();
    assert!(matches!(err, JobError::Store(_)));

    // Prior persisted state is intact: nothing counted yet.
    let summary = h.controller.get_status(job_id).await.unwrap();
    assert_eq!(summary.processed_count, 0);

    // Retrying the same call succeeds and processes every row.
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();
    assert!(outcome.is_complete);
    assert_eq!(outcome.processed_count, 5);
}

#[tokio::test]
async fn cancelled_job_is_a_terminal_noop() {
    let h = harness();
    let job_id = h.controller.create_job(request(20)).await.unwrap();
    h.controller.process_next_chunk(job_id).await.unwrap();

    let summary = h.controller.cancel(job_id).await.unwrap();
    assert_eq!(summary.status, JobStatus::Cancelled);

    let calls_before = h.generator.draft_calls.load(Ordering::SeqCst);
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();
    assert!(outcome.is_complete);
    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert_eq!(outcome.processed_count, 10);
    assert_eq!(h.generator.draft_calls.load(Ordering::SeqCst), calls_before);
}

#[tokio::test]
async fn validation_rejects_bad_creation_input() {
    let h = harness();

    let mut empty_field = request(2);
    empty_field.intent = "  ".into();
    assert!(matches!(
        h.controller.create_job(empty_field).await.unwrap_err(),
        JobError::Validation(_)
    ));

    let mut no_rows = request(1);
    no_rows.prospects.clear();
    assert!(matches!(
        h.controller.create_job(no_rows).await.unwrap_err(),
        JobError::Validation(_)
    ));

    let controller = JobController::with_config(
        h.store.clone(),
        h.researcher.clone(),
        h.generator.clone(),
        ChunkConfig {
            chunk_size: 10,
            sub_batch: 5,
            max_prospects: 3,
        },
    );
    assert!(matches!(
        controller.create_job(request(4)).await.unwrap_err(),
        JobError::Validation(_)
    ));
}

#[tokio::test]
async fn unknown_job_yields_not_found() {
    let h = harness();
    let missing = uuid::Uuid::new_v4();
    assert!(h.controller.get_status(missing).await.unwrap_err().is_not_found());
    assert!(h
        .controller
        .process_next_chunk(missing)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(h.controller.reset(missing, "direct").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn sender_enrichment_failure_falls_back_to_raw_inputs() {
    let h = harness();
    let mut req = request(2);
    req.sender_url = "https://unreachable.sender.example.com".into();

    let job_id = h.controller.create_job(req).await.unwrap();
    let job = h.store.fetch(job_id).await.unwrap();
    assert!(job.sender_facts.is_none());
    assert!(job.enriched_value_prop.is_none());
    assert_eq!(job.effective_value_prop(), "we automate the boring parts");

    // Rows still process normally.
    let outcome = h.controller.process_next_chunk(job_id).await.unwrap();
    assert_eq!(outcome.success_count, 2);
}

#[tokio::test]
async fn successful_enrichment_is_persisted_once() {
    let h = harness();
    let job_id = h.controller.create_job(request(2)).await.unwrap();

    let job = h.store.fetch(job_id).await.unwrap();
    assert!(job.sender_facts.is_some());
    assert_eq!(job.effective_value_prop(), "Rewritten value prop.");
    // One research call for the sender at creation time.
    assert_eq!(h.researcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn driver_runs_job_to_completion_serially() {
    let h = harness();
    let job_id = h.controller.create_job(request(25)).await.unwrap();

    let driver = JobDriver::new(h.controller.clone());
    let outcome = driver.run_to_completion(job_id).await.unwrap();
    assert!(outcome.is_complete);
    assert_eq!(outcome.processed_count, 25);
    assert_eq!(outcome.success_count, 25);
}
