//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::jobs::{JobController, PostgresJobStore};
use crate::pipeline::generate::OpenAiDraftGenerator;
use crate::scraper::SiteScraper;
use crate::server::routes::{
    cancel_job_handler, create_job_handler, export_handler, health_handler,
    job_status_handler, process_chunk_handler, reset_job_handler,
};
use openai_client::OpenAIClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub controller: Arc<JobController>,
}

/// Build the Axum application router.
///
/// The store handle and both collaborators are constructed here and injected
/// into the controller; nothing below this point reaches for globals.
pub fn build_app(pool: PgPool, openai_api_key: String, openai_model: String) -> anyhow::Result<Router> {
    let store = Arc::new(PostgresJobStore::new(pool.clone()));
    let researcher = Arc::new(SiteScraper::new()?);
    let generator = Arc::new(OpenAiDraftGenerator::new(
        OpenAIClient::new(openai_api_key),
        openai_model,
    ));
    let controller = Arc::new(JobController::new(store, researcher, generator));

    let state = AppState {
        db_pool: pool,
        controller,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/jobs", post(create_job_handler))
        .route("/api/jobs/:id", get(job_status_handler))
        .route("/api/jobs/:id/process", post(process_chunk_handler))
        .route("/api/jobs/:id/reset", post(reset_job_handler))
        .route("/api/jobs/:id/cancel", post(cancel_job_handler))
        .route("/api/jobs/:id/export", get(export_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}
