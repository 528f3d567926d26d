//! Request routing.
//!
//! ## Routes (in registration order)
//!
//! - `GET /` - landing page
//! - `GET /results/*` - static files from the results directory (only if configured)
//! - `GET /api/videos` - `getVideos`
//! - `GET /thumbnail/{filename}` - `getThumbnail`
//! - `GET /process/{jobId}/status` - `getStatus`
//! - `POST /process/{filename}` - `postVideo`
//!
//! The API routes come from [`API_ROUTES`], the same table the landing
//! page renders.
//!
//! The route table is built once before the listener is bound and never
//! changes afterwards. Anything unmatched gets axum's default 404 (or 405
//! for a known path with the wrong method). Handler responses, including
//! errors, pass through untouched.

use std::future::Future;
use std::time::Duration;

use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, on, MethodFilter, MethodRouter};
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{ResultsMount, ServerConfig};
use crate::handlers::{landing_page, ApiRoute, Handler, HandlerRequest, HandlerSet, Operation, API_ROUTES};

/// Largest body buffered into a [`HandlerRequest`]
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Prefix of the static results mount
pub const RESULTS_PREFIX: &str = "/results";

/// Install every route on `router`.
///
/// Consumes `handlers`, so the same set cannot be registered twice.
/// When `results` is disabled the `/results` mount is skipped and its
/// warning is logged here, once. API routes follow [`API_ROUTES`] order.
pub fn register_routes(router: Router, handlers: HandlerSet, results: &ResultsMount) -> Router {
    let mut router = router.route("/", get(landing_page));

    match results {
        ResultsMount::Enabled(root) => {
            info!(root = %root.display(), prefix = RESULTS_PREFIX, "Serving static results");
            router = router.nest_service(RESULTS_PREFIX, ServeDir::new(root));
        }
        ResultsMount::Disabled => {
            if let Some(message) = results.warning() {
                warn!("{}", message);
            }
        }
    }

    API_ROUTES.iter().fold(router, |router, route| {
        let handler = match route.operation {
            Operation::GetVideos => handlers.get_videos.clone(),
            Operation::GetThumbnail => handlers.get_thumbnail.clone(),
            Operation::GetStatus => handlers.get_status.clone(),
            Operation::PostVideo => handlers.post_video.clone(),
        };
        router.route(route.path, endpoint(route, handler))
    })
}

/// Build the full application router with the standard layers
pub fn create_router(handlers: HandlerSet, results: &ResultsMount, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    register_routes(Router::new(), handlers, results)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(server.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout),
        ))
        .layer(TraceLayer::new_for_http())
}

fn endpoint(route: &ApiRoute, handler: Handler) -> MethodRouter {
    let filter = match route.method {
        "POST" => MethodFilter::POST,
        _ => MethodFilter::GET,
    };

    match route.param {
        None => on(filter, move |request: Request| dispatch(handler, Vec::new(), request)),
        Some(label) => on(
            filter,
            move |Path(value): Path<String>, request: Request| {
                dispatch(handler, vec![(label, value)], request)
            },
        ),
    }
}

fn dispatch(
    handler: Handler,
    params: Vec<(&'static str, String)>,
    request: Request,
) -> impl Future<Output = Response> + Send {
    async move {
        match HandlerRequest::from_request(request, params, MAX_BUFFERED_BODY).await {
            Ok(req) => handler(req).await,
            Err(e) => e.into_response(),
        }
    }
}
