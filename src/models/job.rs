//! Processing job model.
//!
//! A `Job` tracks one run of the external centroid processor over a video.
//! Jobs live in memory only and move through
//! `processing -> done | error`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Status of a processing job.
///
/// Serializes as `{"status": "processing"}`,
/// `{"status": "done", "result": "/results/<id>.csv"}` or
/// `{"status": "error", "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    /// The processor is still running
    Processing,
    /// The processor finished; `result` is the public URL of its output
    Done { result: String },
    /// The processor failed
    Error { error: String },
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// Validated parameters for a processing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    /// Six upper-case hex digits, no leading `#`
    pub target_color: String,
    /// Colour distance threshold
    pub threshold: u32,
}

impl JobParams {
    /// Parse the `targetColor` and `threshold` query values.
    pub fn parse(target_color: Option<&str>, threshold: Option<&str>) -> Result<Self> {
        let (target_color, threshold) = match (target_color, threshold) {
            (Some(color), Some(threshold)) if !color.is_empty() && !threshold.is_empty() => {
                (color, threshold)
            }
            _ => return Err(AppError::validation("Missing targetColor or threshold.")),
        };

        let hex = target_color.strip_prefix('#').unwrap_or(target_color);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::validation(format!(
                "targetColor must be a 6-digit hex colour, got '{}'",
                target_color
            )));
        }

        let threshold = threshold.parse::<u32>().map_err(|_| {
            AppError::validation(format!(
                "threshold must be a non-negative integer, got '{}'",
                threshold
            ))
        })?;

        Ok(Self {
            target_color: hex.to_ascii_uppercase(),
            threshold,
        })
    }
}

/// A processing job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier
    pub id: Uuid,

    /// Video file name the job runs over
    pub video: String,

    /// Parameters handed to the processor
    pub target_color: String,
    pub threshold: u32,

    /// Current status
    pub status: JobStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job in the `processing` state
    pub fn new(video: String, params: &JobParams) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            video,
            target_color: params.target_color.clone(),
            threshold: params.threshold,
            status: JobStatus::Processing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the job as done with the public URL of its result
    pub fn mark_done(&mut self, result: impl Into<String>) {
        self.status = JobStatus::Done {
            result: result.into(),
        };
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Error {
            error: error.into(),
        };
        self.updated_at = Utc::now();
    }
}

/// Response for `POST /process/:filename`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

/// Response for `GET /process/:jobId/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub video: String,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            video: job.video.clone(),
            status: job.status.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
