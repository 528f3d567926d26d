//! Landing page for `GET /` and the API route table.

use axum::response::Html;

/// The handler a route dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetVideos,
    GetThumbnail,
    GetStatus,
    PostVideo,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::GetVideos => "getVideos",
            Self::GetThumbnail => "getThumbnail",
            Self::GetStatus => "getStatus",
            Self::PostVideo => "postVideo",
        }
    }
}

/// One declared API route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiRoute {
    pub method: &'static str,
    /// Pattern in `:name` notation, as advertised to clients
    pub pattern: &'static str,
    /// Pattern in the router's `{name}` notation
    pub path: &'static str,
    /// Name the path parameter is handed to the handler under
    pub param: Option<&'static str>,
    pub operation: Operation,
}

/// The API routes, in registration order.
///
/// Both process routes name their first segment `{id}`: the matcher
/// rejects differently named parameters at the same position.
pub const API_ROUTES: &[ApiRoute] = &[
    ApiRoute {
        method: "GET",
        pattern: "/api/videos",
        path: "/api/videos",
        param: None,
        operation: Operation::GetVideos,
    },
    ApiRoute {
        method: "GET",
        pattern: "/thumbnail/:filename",
        path: "/thumbnail/{filename}",
        param: Some("filename"),
        operation: Operation::GetThumbnail,
    },
    ApiRoute {
        method: "GET",
        pattern: "/process/:jobId/status",
        path: "/process/{id}/status",
        param: Some("jobId"),
        operation: Operation::GetStatus,
    },
    ApiRoute {
        method: "POST",
        pattern: "/process/:filename",
        path: "/process/{id}",
        param: Some("filename"),
        operation: Operation::PostVideo,
    },
];

/// Render the landing page body
pub fn landing_html() -> String {
    let items: String = API_ROUTES
        .iter()
        .map(|route| format!("<li>{} {}</li>", route.method, route.pattern))
        .collect();

    format!(
        "🚀 Centroid Finder API is running! Available routes: <ul>{}</ul>",
        items
    )
}

/// GET /
pub async fn landing_page() -> Html<String> {
    Html(landing_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_lists_every_route() {
        let html = landing_html();
        for pattern in [
            "/api/videos",
            "/thumbnail/:filename",
            "/process/:filename",
            "/process/:jobId/status",
        ] {
            assert!(html.contains(pattern), "missing {}", pattern);
        }
    }

    #[test]
    fn test_route_table_covers_each_operation_once() {
        for operation in [
            Operation::GetVideos,
            Operation::GetThumbnail,
            Operation::GetStatus,
            Operation::PostVideo,
        ] {
            let count = API_ROUTES
                .iter()
                .filter(|route| route.operation == operation)
                .count();
            assert_eq!(count, 1, "{}", operation.name());
        }
    }

    #[test]
    fn test_route_patterns_agree() {
        for route in API_ROUTES {
            let advertised = route.pattern.split('/').filter(|s| !s.is_empty()).count();
            let registered = route.path.split('/').filter(|s| !s.is_empty()).count();
            assert_eq!(advertised, registered, "{}", route.pattern);
            assert_eq!(route.param.is_some(), route.path.contains('{'));
        }
    }
}
