//! In-memory job registry and the runner that feeds it.
//!
//! Submitting a job records it as `processing` and spawns a tokio task that
//! runs the external processor. The task moves the job to `done` or `error`
//! when the processor exits. Nothing is persisted; a restart forgets all jobs.
//! Finished jobs are swept out once they are older than the retention
//! period, checked on each submission.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Job, JobParams};
use crate::services::command::{CommandRunner, Substitutions};

/// Concurrent map of job id to job
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new `processing` job
    pub fn create(&self, video: impl Into<String>, params: &JobParams) -> Job {
        let job = Job::new(video.into(), params);
        self.jobs.insert(job.id, job.clone());
        job
    }

    /// Look up a job by its textual id.
    ///
    /// Ids that are not UUIDs cannot exist, so they are reported as
    /// not found rather than as bad requests.
    pub fn get(&self, job_id: &str) -> Option<Job> {
        let id = Uuid::parse_str(job_id).ok()?;
        self.jobs.get(&id).map(|job| job.clone())
    }

    pub fn complete(&self, id: Uuid, result: impl Into<String>) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.mark_done(result);
        }
    }

    pub fn fail(&self, id: Uuid, error: impl Into<String>) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.mark_failed(error);
        }
    }

    /// Drop finished jobs last updated before `cutoff`. Running jobs stay.
    pub fn sweep(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        before.saturating_sub(self.jobs.len())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Starts processor runs and tracks them in a [`JobRegistry`]
#[derive(Debug, Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    processor: CommandRunner,
    results_dir: Option<PathBuf>,
    retention: Option<chrono::Duration>,
}

impl JobRunner {
    pub fn new(processor: CommandRunner, results_dir: Option<PathBuf>) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            processor,
            results_dir,
            retention: None,
        }
    }

    /// Forget finished jobs after `seconds`; 0 keeps them forever
    pub fn with_retention(mut self, seconds: u64) -> Self {
        self.retention = (seconds > 0)
            .then(|| chrono::Duration::try_seconds(seconds as i64))
            .flatten();
        self
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Output file for a job inside the results directory
    pub fn output_path(results_dir: &Path, id: Uuid) -> PathBuf {
        results_dir.join(format!("{}.csv", id))
    }

    /// Public URL of a job's output under the `/results` mount
    pub fn result_url(id: Uuid) -> String {
        format!("/results/{}.csv", id)
    }

    /// Create a job for `video` and start the processor in the background.
    ///
    /// # Errors
    /// `AppError::Config` if no results directory is configured; the job is
    /// not created in that case.
    pub fn submit(&self, video_path: &Path, video: &str, params: &JobParams) -> Result<Job> {
        let results_dir = self.results_dir.as_deref().ok_or_else(|| {
            AppError::config("RESULTS_DIR is not configured; cannot store job output")
        })?;

        if let Some(retention) = self.retention {
            let swept = self.registry.sweep(Utc::now() - retention);
            if swept > 0 {
                debug!(swept, "Expired finished jobs");
            }
        }

        let job = self.registry.create(video, params);
        let output = Self::output_path(results_dir, job.id);

        let vars = Substitutions::new()
            .with("input", video_path.display().to_string())
            .with("output", output.display().to_string())
            .with("target_color", params.target_color.clone())
            .with("threshold", params.threshold.to_string())
            .with("job_id", job.id.to_string());

        info!(
            job_id = %job.id,
            video = %video,
            target_color = %params.target_color,
            threshold = params.threshold,
            "Job submitted"
        );

        let registry = Arc::clone(&self.registry);
        let processor = self.processor.clone();
        let id = job.id;

        tokio::spawn(async move {
            match processor.run(&vars).await {
                Ok(_) => {
                    registry.complete(id, Self::result_url(id));
                    info!(job_id = %id, "Job finished");
                }
                Err(e) => {
                    warn!(job_id = %id, error = %e, "Job failed");
                    registry.fail(id, e.to_string());
                }
            }
        });

        Ok(job)
    }
}
