//! Axum route handlers for the Jobs API: submit, poll, fetch artifacts.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::job::{JobInput, JobResult, JobState, Language};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub job_description: String,
    pub cv_text: String,
    #[serde(default)]
    pub language: Language,
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub state: JobState,
    pub stage_index: usize,
    pub log: Vec<String>,
    pub result: Option<JobResult>,
    pub submitted_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
///
/// Validates the input, creates a queued job, and hands it to the
/// scheduler. Returns immediately; clients poll the status endpoint until
/// the state is terminal. Rejected submissions never create a job record.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitJobRequest>,
) -> Result<Json<SubmitJobResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if request.cv_text.trim().is_empty() {
        return Err(AppError::Validation("No CV provided".to_string()));
    }

    let job_id = state.store.create(JobInput {
        job_description: request.job_description,
        cv_text: request.cv_text,
        language: request.language,
        account_id: request.account_id,
    });
    state.scheduler.submit(job_id).map_err(AppError::Internal)?;

    Ok(Json(SubmitJobResponse { job_id }))
}

/// GET /api/v1/jobs/:id
///
/// Returns a consistent snapshot of the job: state, stage index, log, and
/// (for completed jobs) the result.
pub async fn handle_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = state
        .store
        .get(job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        state: job.state,
        stage_index: job.stage_index,
        log: job.log,
        result: job.result,
        submitted_at: job.submitted_at,
    }))
}

/// GET /api/v1/jobs/:id/artifacts/:kind
///
/// Streams a compiled PDF for a completed job. `kind` is `cv` or
/// `cover-letter`. Artifacts that failed to compile are reported as
/// missing, matching the job log.
pub async fn handle_artifact(
    State(state): State<AppState>,
    Path((job_id, kind)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let job = state
        .store
        .get(job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let result = job
        .result
        .ok_or_else(|| AppError::Validation(format!("Job {job_id} has no artifacts yet")))?;

    let filename = match kind.as_str() {
        "cv" => result.cv_pdf,
        "cover-letter" => result.cl_pdf,
        _ => {
            return Err(AppError::NotFound(format!(
                "Unknown artifact kind '{kind}'"
            )))
        }
    }
    .ok_or_else(|| AppError::NotFound(format!("No compiled {kind} artifact for job {job_id}")))?;

    let path = std::path::Path::new(&state.config.output_dir).join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("reading {}: {e}", path.display())))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
