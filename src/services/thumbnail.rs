//! Thumbnail extraction.
//!
//! Frames are pulled out of a video by the configured extractor program
//! (`ffmpeg` by default), which writes a single JPEG to stdout.

use std::path::Path;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::command::{CommandRunner, Substitutions};

/// MIME type of extracted thumbnails
pub const THUMBNAIL_MIME: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct ThumbnailExtractor {
    runner: CommandRunner,
}

impl ThumbnailExtractor {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Extract the first frame of `video` as JPEG bytes
    pub async fn extract(&self, video: &Path) -> Result<Vec<u8>> {
        let vars = Substitutions::new().with("input", video.display().to_string());
        let bytes = self.runner.run(&vars).await?;

        if bytes.is_empty() {
            return Err(AppError::processing(format!(
                "{} produced no thumbnail for {}",
                self.runner.program(),
                video.display()
            )));
        }

        debug!(video = %video.display(), size = bytes.len(), "Extracted thumbnail");
        Ok(bytes)
    }
}
