//! REST handlers for the bulk job API.

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::JobError;
use crate::jobs::CreateJobRequest;
use crate::server::app::AppState;

/// JSON error body for all failure responses.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `JobError` → HTTP response mapping.
pub struct ApiError(JobError);

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            JobError::Validation(_) => StatusCode::BAD_REQUEST,
            JobError::NotFound(_) => StatusCode::NOT_FOUND,
            JobError::Store(_) | JobError::Generation(_) | JobError::Research(_) => {
                error!(error = %self.0, "internal error handling job request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub style_id: String,
}

/// `POST /api/jobs`
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let job_id = state.controller.create_job(request).await?;
    Ok((StatusCode::CREATED, Json(CreateJobResponse { job_id })))
}

/// `POST /api/jobs/:id/process`
pub async fn process_chunk_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.controller.process_next_chunk(id).await?;
    Ok(Json(outcome))
}

/// `GET /api/jobs/:id`
pub async fn job_status_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.controller.get_status(id).await?;
    Ok(Json(summary))
}

/// `POST /api/jobs/:id/reset`
pub async fn reset_job_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.controller.reset(id, &request.style_id).await?;
    Ok(Json(summary))
}

/// `POST /api/jobs/:id/cancel`
pub async fn cancel_job_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.controller.cancel(id).await?;
    Ok(Json(summary))
}

/// `GET /api/jobs/:id/export`. CSV download, allowed at any stage.
pub async fn export_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state.controller.export_results(id).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"outreach-{}.csv\"", id),
        ),
    ];
    Ok((headers, csv))
}
