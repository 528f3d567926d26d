//! Application state management.
//!
//! `AppState` bundles the services the default controller works with.
//! It is cheap to clone and shared across requests.

use std::sync::Arc;

use crate::config::Config;
use crate::services::{CommandRunner, JobRunner, ThumbnailExtractor, VideoLibrary};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Input videos
    pub videos: Arc<VideoLibrary>,

    /// Frame extraction for thumbnails
    pub thumbnails: Arc<ThumbnailExtractor>,

    /// Processing jobs
    pub jobs: Arc<JobRunner>,
}

impl AppState {
    /// Create the application state from configuration
    pub fn new(config: Config) -> Self {
        let videos = VideoLibrary::new(config.storage.videos_dir.clone());
        let thumbnails =
            ThumbnailExtractor::new(CommandRunner::new(config.processing.thumbnail.clone()));
        let jobs = JobRunner::new(
            CommandRunner::new(config.processing.processor.clone()),
            config.results_mount().root().map(|p| p.to_path_buf()),
        )
        .with_retention(config.processing.job_retention_seconds);

        Self {
            config: Arc::new(config),
            videos: Arc::new(videos),
            thumbnails: Arc::new(thumbnails),
            jobs: Arc::new(jobs),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("videos", &self.videos.root())
            .field("jobs", &self.jobs.registry().len())
            .finish()
    }
}
