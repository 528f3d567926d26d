//! # Centroid Finder Server
//!
//! HTTP front end for the centroid finder: lists input videos, extracts
//! thumbnails, starts processing jobs and reports their status. Job output
//! is served as static files under `/results`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Request Router                  │
//! │   GET /   /results/*   /api/videos   /thumbnail  │
//! │               /process/{..}[/status]             │
//! ├─────────────────────────────────────────────────┤
//! │        HandlerSet (getVideos, getThumbnail,      │
//! │             postVideo, getStatus)                │
//! ├─────────────────────────────────────────────────┤
//! │              CentroidController                  │
//! │  ┌─────────────┐ ┌─────────────┐ ┌───────────┐  │
//! │  │   Video     │ │  Thumbnail  │ │    Job    │  │
//! │  │  Library    │ │  Extractor  │ │  Runner   │  │
//! │  └─────────────┘ └─────────────┘ └───────────┘  │
//! ├─────────────────────────────────────────────────┤
//! │     File System / external programs (ffmpeg,     │
//! │               centroid processor)                │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! VIDEOS_DIR=./videos RESULTS_DIR=./results cargo run --release
//!
//! curl http://localhost:3000/api/videos
//! curl -X POST "http://localhost:3000/process/cat.mp4?targetColor=FF0000&threshold=40"
//! curl http://localhost:3000/process/{jobId}/status
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use config::{Config, ResultsMount};
pub use controller::CentroidController;
pub use error::{AppError, Result};
pub use handlers::{HandlerRequest, HandlerSet, VideoController};
pub use router::{create_router, register_routes};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// Build the application router from configuration using the default controller
pub fn create_app(config: Config) -> Router {
    let results = config.results_mount();
    let server = config.server.clone();
    let state = AppState::new(config);
    let handlers = HandlerSet::from_controller(Arc::new(CentroidController::new(state)));

    create_router(handlers, &results, &server)
}

/// Run the server with the given configuration until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!(
        videos_dir = %config.storage.videos_dir.display(),
        results_mounted = config.results_mount().is_enabled(),
        "Building routes"
    );

    let app = create_app(config);

    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Centroid Finder API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
