//! API request handlers.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;
use url::Url;
use validator::Validate;

use sitereel_models::{Job, JobId};
use sitereel_engine::SubmitOptions;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for video creation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVideoRequest {
    #[validate(url(message = "must be a valid URL"))]
    pub url: String,
    /// Summary character budget (defaults to the engine setting).
    #[serde(default)]
    #[validate(range(min = 50, max = 1000, message = "must be between 50 and 1000"))]
    pub max_chars: Option<usize>,
    /// "async" (default) spawns a background job; "sync" blocks.
    #[serde(default)]
    pub mode: Option<String>,
    /// Whether to acquire reference images from the page.
    #[serde(default)]
    pub include_images: bool,
}

/// Job snapshot response.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub url: String,
    pub status: String,
    /// Artifact filename under the output directory.
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let filename = job
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            job_id: job.id.to_string(),
            url: job.url,
            status: job.status.as_str().to_string(),
            filename,
            error: job.error,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

fn validate_request(state: &AppState, request: &CreateVideoRequest) -> ApiResult<SubmitOptions> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let url = Url::parse(&request.url)
        .map_err(|e| ApiError::validation(format!("invalid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::validation("url must be http or https"));
    }

    Ok(SubmitOptions {
        max_chars: request
            .max_chars
            .unwrap_or(state.orchestrator.config().summary_max_chars),
        include_images: request.include_images,
    })
}

/// POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<Response> {
    let options = validate_request(&state, &request)?;

    match request.mode.as_deref() {
        Some("sync") => {
            info!(url = %request.url, "Running synchronous video job");
            let job = state.orchestrator.run_sync(request.url, options).await?;
            Ok((StatusCode::OK, Json(JobResponse::from(job))).into_response())
        }
        None | Some("async") => {
            let job = state.orchestrator.submit(request.url, options).await;
            info!(job_id = %job.id, "Accepted video job");
            Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))).into_response())
        }
        Some(other) => Err(ApiError::validation(format!(
            "mode must be \"sync\" or \"async\", got \"{other}\""
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub wait: bool,
}

/// GET /api/jobs/:job_id
///
/// With `?wait=true`, polls until the job is terminal or the wait budget
/// runs out, then returns whatever snapshot it last saw. The job keeps
/// running after a timeout.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<JobResponse>> {
    let job_id = JobId::from_string(job_id);

    let mut job = state
        .orchestrator
        .status(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    if query.wait && !job.is_terminal() {
        let deadline = tokio::time::Instant::now() + state.config.wait_budget;
        while !job.is_terminal() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(state.config.wait_interval).await;
            match state.orchestrator.status(&job_id).await {
                Some(snapshot) => job = snapshot,
                None => break,
            }
        }
    }

    Ok(Json(JobResponse::from(job)))
}

/// GET /api/videos/:filename
///
/// Streams a generated artifact from the output directory.
pub async fn download_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::bad_request("invalid filename"));
    }

    let path = state.orchestrator.config().output_dir.join(&filename);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("video not found"));
        }
        Err(e) => return Err(e.into()),
    };

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
