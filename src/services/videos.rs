//! Video library over the configured videos directory.
//!
//! Path parameters reach the controller unvalidated, so every file name is
//! checked here before it touches the file system.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Read-only view of the videos directory
#[derive(Debug, Clone)]
pub struct VideoLibrary {
    root: PathBuf,
}

impl VideoLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!(path = %root.display(), "Video library initialized");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List video file names, sorted.
    ///
    /// Only regular files whose extension maps to a `video/*` MIME type
    /// are returned.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::internal(format!(
                "Error reading video directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut videos = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };

            if is_video(&name) {
                videos.push(name);
            }
        }

        videos.sort();
        debug!(count = videos.len(), "Listed videos");

        Ok(videos)
    }

    /// Resolve a client-supplied file name to a path inside the library.
    ///
    /// # Errors
    /// `Validation` for names that could escape the directory,
    /// `NotFound` if no such file exists.
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;

        let path = self.root.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(AppError::not_found(format!("Video not found: {}", filename))),
        }
    }
}

/// Reject anything but a single plain path component
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() || filename.contains(['\0', '/', '\\']) {
        return Err(AppError::validation(format!(
            "Invalid filename: '{}'",
            filename
        )));
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(AppError::validation(format!(
            "Invalid filename: '{}'",
            filename
        ))),
    }
}

fn is_video(name: &str) -> bool {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::VIDEO)
        .unwrap_or(false)
}
