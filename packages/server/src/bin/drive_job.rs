//! HTTP progress client: drives a job's chunk processing to completion.
//!
//! Repeatedly POSTs `/api/jobs/:id/process`, strictly serialized (the next
//! call goes out only after the previous one returns), until the server
//! reports `is_complete`. Optionally writes the CSV export afterwards.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "drive_job", about = "Drive a bulk outreach job to completion")]
struct Args {
    /// Job identifier to drive
    #[arg(long)]
    job_id: Uuid,

    /// Base URL of the outreach server
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Pause between chunk calls
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Retries per chunk call on transient failures
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Write the CSV export here once the job completes
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ChunkOutcome {
    status: String,
    processed_count: i32,
    success_count: i32,
    failed_count: i32,
    total_prospects: i32,
    remaining_count: i32,
    is_complete: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .context("Failed to create HTTP client")?;

    let process_url = format!("{}/api/jobs/{}/process", args.base_url, args.job_id);
    let mut rounds = 0u32;

    let outcome = loop {
        let outcome = call_with_retries(&client, &process_url, args.max_retries).await?;
        rounds += 1;
        tracing::info!(
            rounds,
            status = %outcome.status,
            processed = outcome.processed_count,
            succeeded = outcome.success_count,
            failed = outcome.failed_count,
            remaining = outcome.remaining_count,
            total = outcome.total_prospects,
            "chunk round complete"
        );

        if outcome.is_complete {
            break outcome;
        }
        tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
    };

    tracing::info!(
        rounds,
        status = %outcome.status,
        succeeded = outcome.success_count,
        failed = outcome.failed_count,
        "job finished"
    );

    if let Some(path) = args.export {
        let export_url = format!("{}/api/jobs/{}/export", args.base_url, args.job_id);
        let csv = client
            .get(&export_url)
            .send()
            .await
            .context("Export request failed")?
            .error_for_status()
            .context("Export returned an error status")?
            .text()
            .await
            .context("Failed to read export body")?;
        tokio::fs::write(&path, csv)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "export written");
    }

    Ok(())
}

/// One chunk call with bounded retries. Chunk calls are retry-safe: rows
/// already completed or failed are excluded from the next selection.
async fn call_with_retries(
    client: &reqwest::Client,
    url: &str,
    max_retries: u32,
) -> Result<ChunkOutcome> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = async {
            let response = client.post(url).send().await.context("Request failed")?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                bail!("HTTP {}: {}", status, body);
            }
            response
                .json::<ChunkOutcome>()
                .await
                .context("Failed to parse chunk outcome")
        }
        .await;

        match result {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt <= max_retries => {
                tracing::warn!(attempt, error = %e, "chunk call failed; retrying");
                tokio::time::sleep(Duration::from_secs(2u64.pow(attempt.min(5)))).await;
            }
            Err(e) => return Err(e),
        }
    }
}
