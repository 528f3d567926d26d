//! The handler-provider contract.
//!
//! The router needs four capabilities: `get_videos`, `get_thumbnail`,
//! `post_video` and `get_status`. They are supplied either one by one
//! through [`HandlerSetBuilder`], which refuses to build an incomplete set,
//! or all at once from a [`VideoController`] implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::request::HandlerRequest;
use crate::error::{AppError, Result};

/// A shared async request handler
pub type Handler = Arc<dyn Fn(HandlerRequest) -> BoxFuture<'static, Response> + Send + Sync>;

/// Typed form of the handler provider.
///
/// Each operation owns its status codes and body shape.
#[async_trait]
pub trait VideoController: Send + Sync + 'static {
    /// `GET /api/videos`
    async fn get_videos(&self, request: HandlerRequest) -> Response;

    /// `GET /thumbnail/:filename`
    async fn get_thumbnail(&self, request: HandlerRequest) -> Response;

    /// `POST /process/:filename`
    async fn post_video(&self, request: HandlerRequest) -> Response;

    /// `GET /process/:jobId/status`
    async fn get_status(&self, request: HandlerRequest) -> Response;
}

/// A complete set of the four route handlers.
///
/// Not `Clone`: registering routes consumes the set, so one set is
/// installed at most once.
pub struct HandlerSet {
    pub(crate) get_videos: Handler,
    pub(crate) get_thumbnail: Handler,
    pub(crate) post_video: Handler,
    pub(crate) get_status: Handler,
}

impl HandlerSet {
    pub fn builder() -> HandlerSetBuilder {
        HandlerSetBuilder::default()
    }

    /// Adapt a controller into a handler set
    pub fn from_controller<C: VideoController>(controller: Arc<C>) -> Self {
        let videos = Arc::clone(&controller);
        let thumbnail = Arc::clone(&controller);
        let submit = Arc::clone(&controller);
        let status = controller;

        Self {
            get_videos: Arc::new(move |req: HandlerRequest| {
                let c = Arc::clone(&videos);
                async move { c.get_videos(req).await }.boxed()
            }),
            get_thumbnail: Arc::new(move |req: HandlerRequest| {
                let c = Arc::clone(&thumbnail);
                async move { c.get_thumbnail(req).await }.boxed()
            }),
            post_video: Arc::new(move |req: HandlerRequest| {
                let c = Arc::clone(&submit);
                async move { c.post_video(req).await }.boxed()
            }),
            get_status: Arc::new(move |req: HandlerRequest| {
                let c = Arc::clone(&status);
                async move { c.get_status(req).await }.boxed()
            }),
        }
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("get_videos", &"<handler>")
            .field("get_thumbnail", &"<handler>")
            .field("post_video", &"<handler>")
            .field("get_status", &"<handler>")
            .finish()
    }
}

fn boxed<F, Fut>(f: F) -> Handler
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| f(req).boxed())
}

/// Collects handlers one by one; [`build`](Self::build) checks completeness
#[derive(Default)]
pub struct HandlerSetBuilder {
    get_videos: Option<Handler>,
    get_thumbnail: Option<Handler>,
    post_video: Option<Handler>,
    get_status: Option<Handler>,
}

impl HandlerSetBuilder {
    pub fn get_videos<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.get_videos = Some(boxed(f));
        self
    }

    pub fn get_thumbnail<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.get_thumbnail = Some(boxed(f));
        self
    }

    pub fn post_video<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.post_video = Some(boxed(f));
        self
    }

    pub fn get_status<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.get_status = Some(boxed(f));
        self
    }

    /// Finish the set.
    ///
    /// # Errors
    /// `AppError::Config` naming every handler that was not supplied.
    pub fn build(self) -> Result<HandlerSet> {
        let missing: Vec<&str> = [
            ("getVideos", self.get_videos.is_none()),
            ("getThumbnail", self.get_thumbnail.is_none()),
            ("postVideo", self.post_video.is_none()),
            ("getStatus", self.get_status.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (
            self.get_videos,
            self.get_thumbnail,
            self.post_video,
            self.get_status,
        ) {
            (Some(get_videos), Some(get_thumbnail), Some(post_video), Some(get_status)) => {
                Ok(HandlerSet {
                    get_videos,
                    get_thumbnail,
                    post_video,
                    get_status,
                })
            }
            _ => Err(AppError::config(format!(
                "handler provider is missing: {}",
                missing.join(", ")
            ))),
        }
    }
}
