//! Service layer for the centroid finder server.
//!
//! - External program execution (frame extraction, centroid processing)
//! - Video directory access
//! - In-memory job tracking

pub mod command;
pub mod jobs;
pub mod thumbnail;
pub mod videos;

pub use command::{CommandRunner, Substitutions};
pub use jobs::{JobRegistry, JobRunner};
pub use thumbnail::ThumbnailExtractor;
pub use videos::VideoLibrary;
