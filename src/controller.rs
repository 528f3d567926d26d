//! Default handler provider.
//!
//! ## Endpoints
//!
//! - `GET /api/videos` - JSON array of video file names
//! - `GET /thumbnail/{filename}` - first frame as JPEG
//! - `POST /process/{filename}?targetColor=RRGGBB&threshold=N` - start a job, `202 {"jobId"}`
//! - `GET /process/{jobId}/status` - job status JSON
//!
//! File names are validated here, not in the router.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::handlers::{HandlerRequest, VideoController};
use crate::models::{JobParams, JobStatusResponse, SubmitResponse};
use crate::services::thumbnail::THUMBNAIL_MIME;
use crate::state::AppState;

/// Serves the four API operations from [`AppState`]
#[derive(Debug, Clone)]
pub struct CentroidController {
    state: AppState,
}

impl CentroidController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn list_videos(&self) -> Result<Json<Vec<String>>> {
        Ok(Json(self.state.videos.list().await?))
    }

    async fn thumbnail(&self, request: &HandlerRequest) -> Result<Response> {
        let filename = request.param("filename").unwrap_or_default();
        let path = self.state.videos.resolve(filename).await?;
        let jpeg = self.state.thumbnails.extract(&path).await?;

        Ok((
            [
                (header::CONTENT_TYPE, THUMBNAIL_MIME),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            jpeg,
        )
            .into_response())
    }

    async fn submit(&self, request: &HandlerRequest) -> Result<(StatusCode, Json<SubmitResponse>)> {
        let filename = request.param("filename").unwrap_or_default();
        let params = JobParams::parse(request.query("targetColor"), request.query("threshold"))?;
        let path = self.state.videos.resolve(filename).await?;

        let job = self.state.jobs.submit(&path, filename, &params)?;

        Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id: job.id })))
    }

    fn status(&self, request: &HandlerRequest) -> Result<Json<JobStatusResponse>> {
        let job_id = request.param("jobId").unwrap_or_default();
        let job = self
            .state
            .jobs
            .registry()
            .get(job_id)
            .ok_or_else(|| AppError::not_found("Job ID not found"))?;

        debug!(job_id = %job.id, status = job.status.as_str(), "Job status requested");
        Ok(Json(JobStatusResponse::from(&job)))
    }
}

#[async_trait]
impl VideoController for CentroidController {
    async fn get_videos(&self, _request: HandlerRequest) -> Response {
        self.list_videos().await.into_response()
    }

    async fn get_thumbnail(&self, request: HandlerRequest) -> Response {
        self.thumbnail(&request).await.into_response()
    }

    async fn post_video(&self, request: HandlerRequest) -> Response {
        self.submit(&request).await.into_response()
    }

    async fn get_status(&self, request: HandlerRequest) -> Response {
        self.status(&request).into_response()
    }
}
